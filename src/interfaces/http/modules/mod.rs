pub mod commands;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod tokens;
pub mod versions;
