//! Application layer: use cases between the OCPI and OCPP boundaries
//!
//! - `auth`: OCPI credentials check
//! - `commands`: roaming command dispatch and result correlation
//! - `evse`: EVSE id resolution
//! - `handlers`: inbound OCPP Call handling per version
//! - `ports`: outbound interfaces (emitter, callback sender)
//! - `session`: connected charge stations
//! - `transactions`: authorization and recording of station transactions

pub mod auth;
pub mod commands;
pub mod evse;
pub mod handlers;
pub mod ports;
pub mod session;
pub mod transactions;

pub use auth::{AuthGateway, PartyContext};
pub use commands::{CommandDispatcher, DispatchTimeouts, PendingCommands, SharedPendingCommands};
pub use evse::EvseResolver;
pub use handlers::{InboundServices, SharedInboundServices};
pub use session::{SessionRegistry, SharedSessionRegistry};
pub use transactions::{TransactionAuthorizer, TransactionRecorder};
