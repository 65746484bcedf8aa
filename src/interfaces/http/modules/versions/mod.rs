//! Version discovery module: `/ocpi/versions` and `/ocpi/2.2`

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
