//! Inbound interfaces: the OCPI HTTP API and the OCPP WebSocket server

pub mod http;
pub mod ws;
