//! StartTransaction handler

use rust_ocpp::v1_6::messages::start_transaction::StartTransactionRequest;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, to_response, CallOutcome, OcppHandlerV16};

pub async fn handle_start_transaction(handler: &OcppHandlerV16, payload: &Value) -> CallOutcome {
    let req: StartTransactionRequest = parse_request("StartTransaction", payload)?;

    info!(
        charge_station_id = handler.charge_station_id.as_str(),
        connector_id = req.connector_id,
        id_tag = req.id_tag.as_str(),
        meter_start = req.meter_start,
        "StartTransaction"
    );

    let response = handler
        .services
        .authorizer
        .start_v16(&handler.charge_station_id, &req)
        .await?;
    to_response(&response)
}
