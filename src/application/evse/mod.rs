pub mod resolver;

pub use resolver::{EvseId, EvseResolver, DEFAULT_EVSE_ID_PATTERN};
