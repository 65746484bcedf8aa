//! Tokens module (receiver): eMSP tokens pushed to this platform

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
