//! Station-reported transactions: start authorization, updates and ends

pub mod authorizer;
pub mod meter_values;
pub mod recorder;

pub use authorizer::{Authorization, TransactionAuthorizer};
pub use recorder::TransactionRecorder;
