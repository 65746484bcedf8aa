//! Token aggregate
//!
//! OCPI tokens pushed by eMSPs. The token `uid` is the same value a charge
//! station presents as OCPP `idTag` (1.6) or `idToken` (2.0.1).

pub mod model;
pub mod repository;

pub use model::{CacheMode, Token, TokenPatch, TokenType};
pub use repository::TokenStore;
