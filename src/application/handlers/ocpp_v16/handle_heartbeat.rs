use chrono::Utc;
use rust_ocpp::v1_6::messages::heart_beat::HeartbeatResponse;
use serde_json::Value;
use tracing::debug;

use crate::application::handlers::{to_response, CallOutcome, OcppHandlerV16};

pub async fn handle_heartbeat(handler: &OcppHandlerV16, _payload: &Value) -> CallOutcome {
    debug!(charge_station_id = handler.charge_station_id.as_str(), "Heartbeat");
    to_response(&HeartbeatResponse {
        current_time: Utc::now(),
    })
}
