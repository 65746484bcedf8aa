//! Commands module (receiver): START_SESSION / STOP_SESSION from eMSPs

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
