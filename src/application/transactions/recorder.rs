//! Transaction updates and ends
//!
//! Update and end reports only ever append meter values to the stored
//! transaction. A report for a transaction the bridge never saw start is
//! still recorded, so nothing the station sends is lost.

use std::sync::Arc;

use rust_ocpp::v1_6::messages::meter_values::MeterValuesRequest;
use rust_ocpp::v1_6::messages::stop_transaction::{StopTransactionRequest, StopTransactionResponse};
use rust_ocpp::v2_0_1::messages::transaction_event::{
    TransactionEventRequest, TransactionEventResponse,
};
use tracing::{debug, info};

use super::authorizer::{authorize_id_token, id_token_type_label, Authorization, V16_TOKEN_TYPE};
use crate::domain::transaction::transaction_uuid;
use crate::domain::{MeterValue, StoreProvider, TransactionReport};
use crate::shared::errors::BridgeResult;

pub struct TransactionRecorder {
    stores: Arc<dyn StoreProvider>,
}

impl TransactionRecorder {
    pub fn new(stores: Arc<dyn StoreProvider>) -> Self {
        Self { stores }
    }

    /// 1.6 `MeterValues`. Samples outside a transaction are acknowledged
    /// and dropped.
    pub async fn meter_values_v16(
        &self,
        charge_station_id: &str,
        request: &MeterValuesRequest,
        meter_values: Vec<MeterValue>,
    ) -> BridgeResult<()> {
        let Some(transaction_id) = request.transaction_id else {
            debug!(charge_station_id, connector_id = request.connector_id, "Meter values outside a transaction");
            return Ok(());
        };
        let canonical_id = transaction_uuid(transaction_id).to_string();
        self.stores
            .transactions()
            .update_transaction(charge_station_id, &canonical_id, None, meter_values)
            .await?;
        debug!(charge_station_id, transaction_id, "Transaction updated");
        Ok(())
    }

    /// 1.6 `StopTransaction`. 1.6 has no sequence numbers, so the end is
    /// numbered one past the updates seen so far.
    pub async fn stop_v16(
        &self,
        charge_station_id: &str,
        request: &StopTransactionRequest,
        mut meter_values: Vec<MeterValue>,
    ) -> BridgeResult<StopTransactionResponse> {
        let canonical_id = transaction_uuid(request.transaction_id).to_string();
        let updates = self
            .stores
            .transactions()
            .lookup_transaction(charge_station_id, &canonical_id)
            .await?
            .map_or(0, |tx| tx.updated_seq_no_count);

        let authorization = match &request.id_tag {
            Some(id_tag) => Some(authorize_id_token(self.stores.as_ref(), id_tag).await?),
            None => None,
        };

        meter_values.push(MeterValue::transaction_end(
            request.timestamp.to_rfc3339(),
            request.meter_stop as f32,
        ));
        self.stores
            .transactions()
            .end_transaction(
                charge_station_id,
                &canonical_id,
                TransactionReport {
                    id_token: request.id_tag.clone().unwrap_or_default(),
                    token_type: V16_TOKEN_TYPE.to_string(),
                    meter_values,
                    seq_no: i64::from(updates) + 1,
                    offline: false,
                },
            )
            .await?;

        info!(
            charge_station_id,
            transaction_id = request.transaction_id,
            meter_stop = request.meter_stop,
            "Transaction ended"
        );
        Ok(StopTransactionResponse {
            id_tag_info: authorization.map(Authorization::id_tag_info),
        })
    }

    /// 2.0.1 `TransactionEvent(Updated)`.
    pub async fn update_v201(
        &self,
        charge_station_id: &str,
        request: &TransactionEventRequest,
        meter_values: Vec<MeterValue>,
    ) -> BridgeResult<TransactionEventResponse> {
        let transaction_id = request.transaction_info.transaction_id.as_str();
        let seq_no = i64::from(request.seq_no);
        let applied = self
            .stores
            .transactions()
            .update_transaction(charge_station_id, transaction_id, Some(seq_no), meter_values)
            .await?;
        if applied {
            debug!(charge_station_id, transaction_id, seq_no, "Transaction updated");
        } else {
            info!(charge_station_id, transaction_id, seq_no, "Retransmitted transaction update ignored");
        }
        self.respond_v201(request).await
    }

    /// 2.0.1 `TransactionEvent(Ended)`.
    pub async fn end_v201(
        &self,
        charge_station_id: &str,
        request: &TransactionEventRequest,
        meter_values: Vec<MeterValue>,
    ) -> BridgeResult<TransactionEventResponse> {
        let transaction_id = request.transaction_info.transaction_id.as_str();
        self.stores
            .transactions()
            .end_transaction(
                charge_station_id,
                transaction_id,
                TransactionReport {
                    id_token: request
                        .id_token
                        .as_ref()
                        .map(|t| t.id_token.clone())
                        .unwrap_or_default(),
                    token_type: request
                        .id_token
                        .as_ref()
                        .map(|t| id_token_type_label(&t.kind))
                        .unwrap_or_default(),
                    meter_values,
                    seq_no: i64::from(request.seq_no),
                    offline: request.offline.unwrap_or(false),
                },
            )
            .await?;
        info!(charge_station_id, transaction_id, "Transaction ended");
        self.respond_v201(request).await
    }

    /// `idTokenInfo` is only returned when the event presented a token.
    async fn respond_v201(
        &self,
        request: &TransactionEventRequest,
    ) -> BridgeResult<TransactionEventResponse> {
        let id_token_info = match &request.id_token {
            Some(token) => Some(
                authorize_id_token(self.stores.as_ref(), &token.id_token)
                    .await?
                    .id_token_info(),
            ),
            None => None,
        };
        Ok(TransactionEventResponse {
            total_cost: None,
            charging_priority: None,
            id_token_info,
            updated_personal_message: None,
        })
    }
}
