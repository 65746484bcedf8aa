use chrono::Utc;
use rust_ocpp::v2_0_1::messages::heartbeat::HeartbeatResponse;
use serde_json::Value;
use tracing::debug;

use crate::application::handlers::{to_response, CallOutcome, OcppHandlerV201};

pub async fn handle_heartbeat(handler: &OcppHandlerV201, _payload: &Value) -> CallOutcome {
    debug!(charge_station_id = handler.charge_station_id.as_str(), "V201 Heartbeat");
    to_response(&HeartbeatResponse {
        current_time: Utc::now(),
    })
}
