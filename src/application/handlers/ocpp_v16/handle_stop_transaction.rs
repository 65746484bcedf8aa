//! StopTransaction handler

use rust_ocpp::v1_6::messages::stop_transaction::StopTransactionRequest;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, to_response, CallFailure, CallOutcome, OcppHandlerV16};
use crate::application::transactions::meter_values;

pub async fn handle_stop_transaction(handler: &OcppHandlerV16, payload: &Value) -> CallOutcome {
    let req: StopTransactionRequest = parse_request("StopTransaction", payload)?;
    let samples = meter_values::from_v16(payload.get("transactionData"))
        .map_err(|e| CallFailure::formation("StopTransaction", e))?;

    info!(
        charge_station_id = handler.charge_station_id.as_str(),
        transaction_id = req.transaction_id,
        meter_stop = req.meter_stop,
        reason = ?req.reason,
        "StopTransaction"
    );

    let response = handler
        .services
        .recorder
        .stop_v16(&handler.charge_station_id, &req, samples)
        .await?;
    to_response(&response)
}
