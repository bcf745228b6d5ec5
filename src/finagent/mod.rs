// src/finagent/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod relay;
pub mod runner;
pub mod server_auth;
pub mod session;
pub mod tool_protocol;
pub mod tool_protocols;
pub mod tools;

#[cfg(feature = "a2a-server")]
pub mod a2a_server;

// Let's explicitly export the headline types so callers don't have to access
// them via finagent::agent::Agent and instead as finagent::Agent.
pub use agent::Agent;
pub use runner::{Runner, TurnOutcome};
pub use session::SessionStore;
