//! Transaction store interface
//!
//! Writes are atomic per (charge station, transaction id).

use async_trait::async_trait;

use super::{MeterValue, Transaction, TransactionReport};
use crate::shared::errors::StoreResult;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Open a transaction, or merge into one that already exists.
    async fn create_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        report: TransactionReport,
    ) -> StoreResult<()>;

    /// Append meter values and count the update. A `seq_no` that was
    /// already applied to this transaction leaves it unchanged; the return
    /// value says whether the update was applied.
    async fn update_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        seq_no: Option<i64>,
        meter_values: Vec<MeterValue>,
    ) -> StoreResult<bool>;

    /// Append the final meter values and record the end sequence number.
    async fn end_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        report: TransactionReport,
    ) -> StoreResult<()>;

    async fn lookup_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>>;

    /// Find a transaction by id without knowing its charge station.
    async fn find_transaction(&self, transaction_id: &str) -> StoreResult<Option<Transaction>>;
}
