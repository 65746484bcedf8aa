//! OCPP 1.6 Calls

mod remote_start;
mod remote_stop;

use super::call_maker::{CallMaker, RemoteStart};
use crate::application::ports::OcppCall;
use crate::domain::OcppVersion;
use crate::shared::errors::BridgeResult;

/// `idTag` is a CiString20Type in OCPP 1.6.
pub const MAX_ID_TAG_LEN: usize = 20;

pub struct V16CallMaker;

impl CallMaker for V16CallMaker {
    fn version(&self) -> OcppVersion {
        OcppVersion::V16
    }

    fn remote_start(&self, request: &RemoteStart) -> BridgeResult<OcppCall> {
        remote_start::remote_start_transaction(request)
    }

    fn remote_stop(&self, transaction_id: &str) -> BridgeResult<OcppCall> {
        remote_stop::remote_stop_transaction(transaction_id)
    }
}
