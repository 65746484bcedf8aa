//! WebSocket interfaces
//!
//! - `ocpp_server`: OCPP WebSocket server (1.6 and 2.0.1)
//! - `negotiator`: subprotocol negotiation

pub mod negotiator;
pub mod ocpp_server;

pub use negotiator::ProtocolNegotiator;
pub use ocpp_server::OcppServer;
