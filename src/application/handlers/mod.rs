//! Inbound OCPP message handlers
//!
//! One handler instance per station connection. Each action has its own
//! module returning either a response payload or a [`CallFailure`] that is
//! sent back as a CallError.

mod ocpp_v16;
mod ocpp_v16_handler;
mod ocpp_v201;
mod ocpp_v201_handler;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::application::commands::SharedPendingCommands;
use crate::application::transactions::{TransactionAuthorizer, TransactionRecorder};
use crate::shared::errors::BridgeError;
use crate::shared::ocpp_frame::{OcppErrorCode, OcppFrame};

pub use ocpp_v16_handler::OcppHandlerV16;
pub use ocpp_v201_handler::OcppHandlerV201;

/// Heartbeat interval handed to stations in BootNotification responses.
pub const HEARTBEAT_INTERVAL_SECS: u16 = 300;

/// Services shared by every station connection.
pub struct InboundServices {
    pub authorizer: TransactionAuthorizer,
    pub recorder: TransactionRecorder,
    pub pending: SharedPendingCommands,
}

pub type SharedInboundServices = Arc<InboundServices>;

/// A Call the bridge answers with a CallError.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFailure {
    pub code: OcppErrorCode,
    pub description: String,
}

impl CallFailure {
    pub fn not_implemented(action: &str) -> Self {
        Self {
            code: OcppErrorCode::NotImplemented,
            description: format!("{action} is not supported"),
        }
    }

    pub fn formation(action: &str, error: impl std::fmt::Display) -> Self {
        Self {
            code: OcppErrorCode::FormationViolation,
            description: format!("invalid {action} payload: {error}"),
        }
    }
}

impl From<BridgeError> for CallFailure {
    fn from(e: BridgeError) -> Self {
        Self {
            code: OcppErrorCode::InternalError,
            description: e.to_string(),
        }
    }
}

pub type CallOutcome = Result<Value, CallFailure>;

pub(crate) fn parse_request<T: DeserializeOwned>(action: &str, payload: &Value) -> Result<T, CallFailure> {
    serde_json::from_value(payload.clone()).map_err(|e| CallFailure::formation(action, e))
}

pub(crate) fn to_response<T: Serialize>(response: &T) -> CallOutcome {
    serde_json::to_value(response).map_err(|e| CallFailure {
        code: OcppErrorCode::InternalError,
        description: format!("failed to serialize response: {e}"),
    })
}

/// Frame the outcome of a Call for the wire.
pub(crate) fn reply(charge_station_id: &str, unique_id: &str, action: &str, outcome: CallOutcome) -> String {
    match outcome {
        Ok(payload) => OcppFrame::result(unique_id, payload).serialize(),
        Err(failure) => {
            warn!(
                charge_station_id,
                message_id = unique_id,
                action,
                error_code = failure.code.as_str(),
                description = failure.description.as_str(),
                "Answering Call with CallError"
            );
            OcppFrame::error(unique_id, failure.code, failure.description).serialize()
        }
    }
}

/// Route a CallResult / CallError to the command awaiting it.
pub(crate) fn resolve_response(pending: &SharedPendingCommands, charge_station_id: &str, frame: OcppFrame) {
    let (unique_id, resolved) = match frame {
        OcppFrame::CallResult { unique_id, payload } => {
            let resolved = pending.resolve_result(charge_station_id, &unique_id, &payload);
            (unique_id, resolved)
        }
        OcppFrame::CallError {
            unique_id,
            error_code,
            error_description,
            ..
        } => {
            let resolved =
                pending.resolve_error(charge_station_id, &unique_id, &error_code, &error_description);
            (unique_id, resolved)
        }
        OcppFrame::Call { .. } => return,
    };
    if resolved {
        info!(charge_station_id, message_id = unique_id.as_str(), "Station answered command");
    } else {
        warn!(
            charge_station_id,
            message_id = unique_id.as_str(),
            "Response does not match any pending command"
        );
    }
}
