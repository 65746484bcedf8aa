//! Version-specific Call construction
//!
//! Each supported OCPP version registers one [`CallMaker`]. The dispatcher
//! only ever talks to this trait, so a new protocol version is one more
//! implementation and one more `register` call.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::ports::OcppCall;
use crate::domain::{OcppVersion, TokenType};
use crate::shared::errors::{BridgeError, BridgeResult};

/// Abstract remote start, independent of OCPP version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStart {
    pub id_token: String,
    pub token_type: TokenType,
    /// 1.6 connector id or 2.0.1 EVSE id.
    pub connector_id: Option<u32>,
}

pub trait CallMaker: Send + Sync {
    fn version(&self) -> OcppVersion;

    fn remote_start(&self, request: &RemoteStart) -> BridgeResult<OcppCall>;

    /// `transaction_id` is the canonical transaction id.
    fn remote_stop(&self, transaction_id: &str) -> BridgeResult<OcppCall>;
}

/// Fresh OCPP message unique id, also used as the command's correlation
/// reference.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn to_payload<T: serde::Serialize>(action: &str, request: &T) -> BridgeResult<serde_json::Value> {
    serde_json::to_value(request)
        .map_err(|e| BridgeError::InvalidCall(format!("{action} serialization failed: {e}")))
}

/// Registered call makers, keyed by version.
#[derive(Clone, Default)]
pub struct CallMakers {
    makers: HashMap<OcppVersion, Arc<dyn CallMaker>>,
}

impl CallMakers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call makers for every version this crate implements.
    pub fn supported() -> Self {
        let mut makers = Self::new();
        makers.register(Arc::new(super::v16::V16CallMaker));
        makers.register(Arc::new(super::v201::V201CallMaker));
        makers
    }

    pub fn register(&mut self, maker: Arc<dyn CallMaker>) {
        info!(version = %maker.version(), "Registered call maker");
        self.makers.insert(maker.version(), maker);
    }

    pub fn get(&self, version: OcppVersion) -> Option<&Arc<dyn CallMaker>> {
        self.makers.get(&version)
    }
}
