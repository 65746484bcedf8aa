//! Charge station runtime details
//!
//! The bridge never owns charge station configuration; it only reads the
//! protocol version the station negotiated when it last connected.

pub mod model;
pub mod repository;

pub use model::RuntimeDetails;
pub use repository::ChargeStationRuntimeStore;
