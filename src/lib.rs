//! # Texnouz OCPI Bridge
//!
//! Bridges OCPI 2.2 roaming commands from eMSPs to OCPP 1.6 / 2.0.1 charge
//! stations, and records the transactions the stations report back.
//!
//! ## Architecture
//!
//! - **domain**: entities and store traits (tokens, registrations, transactions)
//! - **application**: command dispatch, OCPP message handling, transaction authorization
//! - **infrastructure**: in-memory store, session emitter, HTTP callback client
//! - **interfaces**: OCPI HTTP API and OCPP WebSocket server
//! - **shared**: errors, OCPP-J framing, retry, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiState};
