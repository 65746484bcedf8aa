//! RequestStopTransaction

use rust_ocpp::v2_0_1::messages::request_stop_transaction::RequestStopTransactionRequest;

use super::MAX_IDENTIFIER_LEN;
use crate::application::commands::call_maker::{new_message_id, to_payload};
use crate::application::ports::OcppCall;
use crate::shared::errors::{BridgeError, BridgeResult};

const ACTION: &str = "RequestStopTransaction";

pub(super) fn request_stop_transaction(transaction_id: &str) -> BridgeResult<OcppCall> {
    if transaction_id.is_empty() || transaction_id.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(BridgeError::InvalidCall(format!(
            "transactionId must be 1..={MAX_IDENTIFIER_LEN} characters"
        )));
    }
    let call = RequestStopTransactionRequest {
        transaction_id: transaction_id.to_string(),
    };
    Ok(OcppCall {
        message_id: new_message_id(),
        action: ACTION,
        payload: to_payload(ACTION, &call)?,
    })
}
