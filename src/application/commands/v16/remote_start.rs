//! RemoteStartTransaction

use rust_ocpp::v1_6::messages::remote_start_transaction::RemoteStartTransactionRequest;
use tracing::debug;

use super::MAX_ID_TAG_LEN;
use crate::application::commands::call_maker::{new_message_id, to_payload, RemoteStart};
use crate::application::ports::OcppCall;
use crate::shared::errors::{BridgeError, BridgeResult};

const ACTION: &str = "RemoteStartTransaction";

pub(super) fn remote_start_transaction(request: &RemoteStart) -> BridgeResult<OcppCall> {
    if request.id_token.is_empty() || request.id_token.chars().count() > MAX_ID_TAG_LEN {
        return Err(BridgeError::InvalidCall(format!(
            "idTag must be 1..={MAX_ID_TAG_LEN} characters"
        )));
    }
    if request.connector_id == Some(0) {
        return Err(BridgeError::InvalidCall("connectorId must be > 0".into()));
    }

    let call = RemoteStartTransactionRequest {
        connector_id: request.connector_id,
        id_tag: request.id_token.clone(),
        charging_profile: None,
    };
    let message_id = new_message_id();
    debug!(
        message_id = message_id.as_str(),
        connector_id = ?request.connector_id,
        "Built RemoteStartTransaction"
    );

    Ok(OcppCall {
        message_id,
        action: ACTION,
        payload: to_payload(ACTION, &call)?,
    })
}
