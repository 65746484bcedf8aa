//! RequestStartTransaction

use rand::Rng;
use rust_ocpp::v2_0_1::datatypes::id_token_type::IdTokenType;
use rust_ocpp::v2_0_1::enumerations::id_token_enum_type::IdTokenEnumType;
use rust_ocpp::v2_0_1::messages::request_start_transaction::RequestStartTransactionRequest;
use tracing::debug;

use super::MAX_IDENTIFIER_LEN;
use crate::application::commands::call_maker::{new_message_id, to_payload, RemoteStart};
use crate::application::ports::OcppCall;
use crate::domain::TokenType;
use crate::shared::errors::{BridgeError, BridgeResult};

const ACTION: &str = "RequestStartTransaction";

pub(super) fn request_start_transaction(request: &RemoteStart) -> BridgeResult<OcppCall> {
    if request.id_token.is_empty() || request.id_token.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(BridgeError::InvalidCall(format!(
            "idToken must be 1..={MAX_IDENTIFIER_LEN} characters"
        )));
    }
    let evse_id = match request.connector_id {
        None => None,
        Some(id) => match i32::try_from(id) {
            Ok(id) if id > 0 => Some(id),
            _ => return Err(BridgeError::InvalidCall("evseId must be > 0".into())),
        },
    };

    let remote_start_id = rand::thread_rng().gen_range(1..=i32::MAX);
    let call = RequestStartTransactionRequest {
        evse_id,
        remote_start_id,
        id_token: IdTokenType {
            id_token: request.id_token.clone(),
            kind: id_token_kind(request.token_type),
            additional_info: None,
        },
        charging_profile: None,
        group_id_token: None,
    };
    let message_id = new_message_id();
    debug!(
        message_id = message_id.as_str(),
        remote_start_id,
        ?evse_id,
        "Built RequestStartTransaction"
    );

    Ok(OcppCall {
        message_id,
        action: ACTION,
        payload: to_payload(ACTION, &call)?,
    })
}

/// RFID tokens are presented as ISO 14443 cards; every other OCPI token
/// type is authorized centrally.
fn id_token_kind(token_type: TokenType) -> IdTokenEnumType {
    match token_type {
        TokenType::Rfid => IdTokenEnumType::ISO14443,
        TokenType::AppUser | TokenType::AdHocUser | TokenType::Other => IdTokenEnumType::Central,
    }
}
