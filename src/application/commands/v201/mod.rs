//! OCPP 2.0.1 Calls

mod remote_start;
mod remote_stop;

use super::call_maker::{CallMaker, RemoteStart};
use crate::application::ports::OcppCall;
use crate::domain::OcppVersion;
use crate::shared::errors::BridgeResult;

/// `idToken` and `transactionId` are identifierString(36) in OCPP 2.0.1.
pub const MAX_IDENTIFIER_LEN: usize = 36;

pub struct V201CallMaker;

impl CallMaker for V201CallMaker {
    fn version(&self) -> OcppVersion {
        OcppVersion::V201
    }

    fn remote_start(&self, request: &RemoteStart) -> BridgeResult<OcppCall> {
        remote_start::request_start_transaction(request)
    }

    fn remote_stop(&self, transaction_id: &str) -> BridgeResult<OcppCall> {
        remote_stop::request_stop_transaction(transaction_id)
    }
}
