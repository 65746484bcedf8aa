//! OCPI HTTP interface
//!
//! - `middleware`: OCPI credentials check
//! - `modules`: versions, tokens, commands, health and metrics endpoints
//! - `router`: router with Swagger documentation

pub mod common;
pub mod error;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
