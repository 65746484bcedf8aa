//! BootNotification handler

use chrono::Utc;
use rust_ocpp::v1_6::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
use rust_ocpp::v1_6::types::RegistrationStatus;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{
    parse_request, to_response, CallOutcome, OcppHandlerV16, HEARTBEAT_INTERVAL_SECS,
};

pub async fn handle_boot_notification(handler: &OcppHandlerV16, payload: &Value) -> CallOutcome {
    let req: BootNotificationRequest = parse_request("BootNotification", payload)?;

    info!(
        charge_station_id = handler.charge_station_id.as_str(),
        vendor = req.charge_point_vendor.as_str(),
        model = req.charge_point_model.as_str(),
        firmware_version = ?req.firmware_version,
        "BootNotification"
    );

    to_response(&BootNotificationResponse {
        current_time: Utc::now(),
        interval: HEARTBEAT_INTERVAL_SECS.into(),
        status: RegistrationStatus::Accepted,
    })
}
