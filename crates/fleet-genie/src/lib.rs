//! Relay between the dashboard and the Genie conversation API.
//!
//! The relay starts or continues a conversation, polls the message until
//! the remote job settles, and turns the loosely-typed completion payload
//! into a [`fleet_core::ChatResponse`].

pub mod api;
pub mod extract;
pub mod health;
pub mod http;
pub mod relay;

pub use api::{GenieApi, PostedMessage, StartedConversation};
pub use health::health_check;
pub use http::HttpGenieApi;
pub use relay::{ConversationRelay, PollPolicy};
