use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::OcppVersion;

/// Runtime facts about a charge station, written on WebSocket connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeDetails {
    pub ocpp_version: OcppVersion,
    pub connected_at: DateTime<Utc>,
}

impl RuntimeDetails {
    pub fn new(ocpp_version: OcppVersion) -> Self {
        Self {
            ocpp_version,
            connected_at: Utc::now(),
        }
    }
}
