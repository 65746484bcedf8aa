//! RemoteStopTransaction

use rust_ocpp::v1_6::messages::remote_stop_transaction::RemoteStopTransactionRequest;

use crate::application::commands::call_maker::{new_message_id, to_payload};
use crate::application::ports::OcppCall;
use crate::domain::transaction::parse_legacy_transaction_id;
use crate::shared::errors::{BridgeError, BridgeResult};

const ACTION: &str = "RemoteStopTransaction";

pub(super) fn remote_stop_transaction(transaction_id: &str) -> BridgeResult<OcppCall> {
    let legacy_id = parse_legacy_transaction_id(transaction_id)
        .filter(|id| *id >= 0)
        .ok_or_else(|| {
            BridgeError::InvalidCall(format!(
                "transaction {transaction_id} has no OCPP 1.6 transaction id"
            ))
        })?;

    let call = RemoteStopTransactionRequest {
        transaction_id: legacy_id,
    };
    Ok(OcppCall {
        message_id: new_message_id(),
        action: ACTION,
        payload: to_payload(ACTION, &call)?,
    })
}
