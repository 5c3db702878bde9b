pub mod genie;
pub mod turbine;
