use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{round_to, Turbine, TurbineLocation, TurbineStatus};

pub const DEFAULT_FLEET_SIZE: usize = 156;

const CAPACITY_MW: f64 = 3.0;
const BASE_LATITUDE: f64 = 45.5;
const BASE_LONGITUDE: f64 = -73.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetKpis {
    pub total_turbines: usize,
    pub turbines_needing_maintenance: usize,
    pub fleet_health_percentage: f64,
    /// GWh over a day at the current output
    pub total_energy_production: f64,
    pub operational_turbines: usize,
    pub warning_turbines: usize,
    pub offline_turbines: usize,
}

/// Generates `count` turbines named `WT-001` onwards.
pub fn generate_turbines<R: Rng>(rng: &mut R, count: usize, now: DateTime<Utc>) -> Vec<Turbine> {
    (1..=count)
        .map(|index| {
            let id = index as u32;
            let status = TurbineStatus::ALL[rng.random_range(0..TurbineStatus::ALL.len())];
            let operational = status == TurbineStatus::Operational;

            Turbine {
                id,
                name: format!("WT-{:03}", id),
                status,
                location: TurbineLocation {
                    latitude: BASE_LATITUDE + rng.random_range(-0.5..=0.5),
                    longitude: BASE_LONGITUDE + rng.random_range(-0.5..=0.5),
                },
                energy_output: if operational { rng.random_range(0.5..=2.5) } else { 0.0 },
                capacity: CAPACITY_MW,
                health_score: if operational {
                    rng.random_range(70.0..=100.0)
                } else {
                    rng.random_range(40.0..=80.0)
                },
                last_maintenance: now - Duration::days(rng.random_range(1..=90)),
                next_maintenance: now + Duration::days(rng.random_range(1..=90)),
                operational_hours: rng.random_range(1000..=50_000),
                error_codes: if operational {
                    Vec::new()
                } else {
                    vec![format!("ERR{}", rng.random_range(100..=999u32))]
                },
            }
        })
        .collect()
}

pub fn fleet_kpis(turbines: &[Turbine]) -> FleetKpis {
    let count_status = |status: TurbineStatus| turbines.iter().filter(|t| t.status == status).count();

    let total = turbines.len();
    let fleet_health_percentage = if total == 0 {
        0.0
    } else {
        round_to(turbines.iter().map(|t| t.health_score).sum::<f64>() / total as f64, 1)
    };
    let total_output: f64 = turbines.iter().map(|t| t.energy_output).sum();

    FleetKpis {
        total_turbines: total,
        turbines_needing_maintenance: count_status(TurbineStatus::Maintenance),
        fleet_health_percentage,
        total_energy_production: round_to(total_output * 24.0 / 1000.0, 1),
        operational_turbines: count_status(TurbineStatus::Operational),
        warning_turbines: count_status(TurbineStatus::Warning),
        offline_turbines: count_status(TurbineStatus::Offline),
    }
}
