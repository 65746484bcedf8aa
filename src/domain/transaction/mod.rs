//! Transaction aggregate
//!
//! A transaction is opened by the station's start report, grows through
//! update reports and is closed by an end report. Meter values are kept in
//! arrival order and never rewritten.

pub mod model;
pub mod repository;
pub mod transaction_id;

pub use model::{MeterValue, SampledValue, Transaction, TransactionReport, UnitOfMeasure};
pub use repository::TransactionStore;
pub use transaction_id::{legacy_transaction_id, parse_legacy_transaction_id, transaction_uuid};
