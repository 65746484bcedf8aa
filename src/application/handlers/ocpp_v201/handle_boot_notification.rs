//! V201 BootNotification handler

use chrono::Utc;
use rust_ocpp::v2_0_1::enumerations::registration_status_enum_type::RegistrationStatusEnumType;
use rust_ocpp::v2_0_1::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{
    parse_request, to_response, CallOutcome, OcppHandlerV201, HEARTBEAT_INTERVAL_SECS,
};

pub async fn handle_boot_notification(handler: &OcppHandlerV201, payload: &Value) -> CallOutcome {
    // Some stations omit the mandatory `reason`.
    let mut patched = payload.clone();
    if let Some(obj) = patched.as_object_mut() {
        obj.entry("reason").or_insert(serde_json::json!("PowerUp"));
    }
    let req: BootNotificationRequest = parse_request("BootNotification", &patched)?;

    let cs = &req.charging_station;
    info!(
        charge_station_id = handler.charge_station_id.as_str(),
        vendor = cs.vendor_name.as_str(),
        model = cs.model.as_str(),
        reason = ?req.reason,
        "V201 BootNotification"
    );

    to_response(&BootNotificationResponse {
        current_time: Utc::now(),
        interval: HEARTBEAT_INTERVAL_SECS.into(),
        status: RegistrationStatusEnumType::Accepted,
        status_info: None,
    })
}
