use async_trait::async_trait;

use super::RuntimeDetails;
use crate::shared::errors::StoreResult;

#[async_trait]
pub trait ChargeStationRuntimeStore: Send + Sync {
    async fn set_runtime_details(
        &self,
        charge_station_id: &str,
        details: RuntimeDetails,
    ) -> StoreResult<()>;

    async fn lookup_runtime_details(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<RuntimeDetails>>;
}
