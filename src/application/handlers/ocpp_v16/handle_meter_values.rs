//! MeterValues handler

use rust_ocpp::v1_6::messages::meter_values::{MeterValuesRequest, MeterValuesResponse};
use serde_json::Value;

use crate::application::handlers::{parse_request, to_response, CallFailure, CallOutcome, OcppHandlerV16};
use crate::application::transactions::meter_values;

pub async fn handle_meter_values(handler: &OcppHandlerV16, payload: &Value) -> CallOutcome {
    let req: MeterValuesRequest = parse_request("MeterValues", payload)?;
    let samples = meter_values::from_v16(payload.get("meterValue"))
        .map_err(|e| CallFailure::formation("MeterValues", e))?;

    handler
        .services
        .recorder
        .meter_values_v16(&handler.charge_station_id, &req, samples)
        .await?;

    to_response(&MeterValuesResponse {})
}
