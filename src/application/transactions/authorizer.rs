//! Authorization of transaction starts
//!
//! A start report is always persisted, whatever the token lookup says: the
//! station has already begun charging and the record is needed for
//! settlement. Only the status returned to the station differs.

use std::sync::Arc;

use rand::Rng;
use rust_ocpp::v1_6::messages::start_transaction::{
    StartTransactionRequest, StartTransactionResponse,
};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo};
use rust_ocpp::v2_0_1::datatypes::id_token_info_type::IdTokenInfoType;
use rust_ocpp::v2_0_1::enumerations::authorization_status_enum_type::AuthorizationStatusEnumType;
use rust_ocpp::v2_0_1::messages::transaction_event::{
    TransactionEventRequest, TransactionEventResponse,
};
use tracing::{info, warn};

use super::meter_values::energy_register_wh;
use crate::domain::transaction::transaction_uuid;
use crate::domain::{MeterValue, OcppVersion, StoreProvider, TransactionReport};
use crate::shared::errors::{BridgeResult, StoreError};

/// Transaction id a 1.6 station gets when its token is not accepted.
pub const INVALID_TRANSACTION_ID: i32 = -1;

/// Token type recorded for 1.6 starts, which do not report one.
pub const V16_TOKEN_TYPE: &str = "ISO14443";

const MAX_ID_DRAWS: usize = 5;

/// Outcome of a token lookup. An unknown token is a normal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Accepted,
    Invalid,
}

impl Authorization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Invalid => "Invalid",
        }
    }

    pub fn id_tag_info(self) -> IdTagInfo {
        IdTagInfo {
            status: match self {
                Self::Accepted => AuthorizationStatus::Accepted,
                Self::Invalid => AuthorizationStatus::Invalid,
            },
            expiry_date: None,
            parent_id_tag: None,
        }
    }

    pub fn id_token_info(self) -> IdTokenInfoType {
        IdTokenInfoType {
            status: match self {
                Self::Accepted => AuthorizationStatusEnumType::Accepted,
                Self::Invalid => AuthorizationStatusEnumType::Invalid,
            },
            cache_expiry_date_time: None,
            charging_priority: None,
            language1: None,
            evse_id: None,
            language2: None,
            group_id_token: None,
            personal_message: None,
        }
    }
}

/// Look up a presented id token. Presence in the token store is what
/// counts; the token's `valid` flag is left to the eMSP.
pub async fn authorize_id_token(
    stores: &dyn StoreProvider,
    id_token: &str,
) -> BridgeResult<Authorization> {
    Ok(match stores.tokens().lookup_token(id_token).await? {
        Some(_) => Authorization::Accepted,
        None => Authorization::Invalid,
    })
}

/// Label of a 2.0.1 id token's `type`, as it appears on the wire.
pub fn id_token_type_label<T: serde::Serialize>(kind: &T) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn record_started(version: OcppVersion, authorization: Authorization) {
    metrics::counter!(
        "ocpp_transactions_started_total",
        "version" => version.version_string(),
        "status" => authorization.as_str()
    )
    .increment(1);
}

pub struct TransactionAuthorizer {
    stores: Arc<dyn StoreProvider>,
}

impl TransactionAuthorizer {
    pub fn new(stores: Arc<dyn StoreProvider>) -> Self {
        Self { stores }
    }

    /// Handle a 1.6 `StartTransaction`.
    pub async fn start_v16(
        &self,
        charge_station_id: &str,
        request: &StartTransactionRequest,
    ) -> BridgeResult<StartTransactionResponse> {
        let authorization = authorize_id_token(self.stores.as_ref(), &request.id_tag).await?;
        let transaction_id = match authorization {
            Authorization::Accepted => self.allocate_transaction_id().await?,
            Authorization::Invalid => INVALID_TRANSACTION_ID,
        };
        let canonical_id = transaction_uuid(transaction_id).to_string();

        self.stores
            .transactions()
            .create_transaction(
                charge_station_id,
                &canonical_id,
                TransactionReport {
                    id_token: request.id_tag.clone(),
                    token_type: V16_TOKEN_TYPE.to_string(),
                    meter_values: vec![MeterValue::transaction_begin(
                        request.timestamp.to_rfc3339(),
                        request.meter_start as f32,
                    )],
                    seq_no: 0,
                    offline: false,
                },
            )
            .await?;

        record_started(OcppVersion::V16, authorization);
        info!(
            charge_station_id,
            transaction_id,
            canonical_id = canonical_id.as_str(),
            status = authorization.as_str(),
            "Transaction started"
        );

        Ok(StartTransactionResponse {
            id_tag_info: authorization.id_tag_info(),
            transaction_id,
        })
    }

    /// Handle a 2.0.1 `TransactionEvent(Started)`. `meter_values` are the
    /// event's samples, already converted.
    pub async fn start_v201(
        &self,
        charge_station_id: &str,
        request: &TransactionEventRequest,
        meter_values: &[MeterValue],
    ) -> BridgeResult<TransactionEventResponse> {
        let transaction_id = request.transaction_info.transaction_id.as_str();
        let authorization = match &request.id_token {
            Some(token) => Some(authorize_id_token(self.stores.as_ref(), &token.id_token).await?),
            None => None,
        };
        let meter_start = energy_register_wh(meter_values).unwrap_or(0.0);

        self.stores
            .transactions()
            .create_transaction(
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
                    meter_values: vec![MeterValue::transaction_begin(
                        request.timestamp.to_rfc3339(),
                        meter_start,
                    )],
                    seq_no: i64::from(request.seq_no),
                    offline: request.offline.unwrap_or(false),
                },
            )
            .await?;

        match authorization {
            Some(status) => {
                record_started(OcppVersion::V201, status);
                info!(
                    charge_station_id,
                    transaction_id,
                    status = status.as_str(),
                    "Transaction started"
                );
            }
            None => info!(charge_station_id, transaction_id, "Transaction started without id token"),
        }

        Ok(TransactionEventResponse {
            total_cost: None,
            charging_priority: None,
            id_token_info: authorization.map(Authorization::id_token_info),
            updated_personal_message: None,
        })
    }

    /// Draw a random non-negative 31-bit id that no stored transaction uses.
    async fn allocate_transaction_id(&self) -> BridgeResult<i32> {
        for _ in 0..MAX_ID_DRAWS {
            let candidate = rand::thread_rng().gen_range(0..=i32::MAX);
            let canonical = transaction_uuid(candidate).to_string();
            match self.stores.transactions().find_transaction(&canonical).await? {
                None => return Ok(candidate),
                Some(_) => warn!(candidate, "Transaction id collision, drawing again"),
            }
        }
        Err(StoreError::Backend(format!(
            "no free transaction id after {MAX_ID_DRAWS} draws"
        ))
        .into())
    }
}
