//! V201 TransactionEvent handler
//!
//! `TransactionEvent` replaces the 1.6 StartTransaction, MeterValues and
//! StopTransaction messages; `event_type` says which one it is.

use rust_ocpp::v2_0_1::enumerations::transaction_event_enum_type::TransactionEventEnumType;
use rust_ocpp::v2_0_1::messages::transaction_event::TransactionEventRequest;
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, to_response, CallFailure, CallOutcome, OcppHandlerV201};
use crate::application::transactions::meter_values;

pub async fn handle_transaction_event(handler: &OcppHandlerV201, payload: &Value) -> CallOutcome {
    let req: TransactionEventRequest = parse_request("TransactionEvent", payload)?;
    let samples = meter_values::from_v201(payload.get("meterValue"))
        .map_err(|e| CallFailure::formation("TransactionEvent", e))?;

    let charge_station_id = handler.charge_station_id.as_str();
    info!(
        charge_station_id,
        event_type = ?req.event_type,
        transaction_id = req.transaction_info.transaction_id.as_str(),
        trigger_reason = ?req.trigger_reason,
        "V201 TransactionEvent"
    );

    let services = &handler.services;
    let response = match req.event_type {
        TransactionEventEnumType::Started => {
            services
                .authorizer
                .start_v201(charge_station_id, &req, &samples)
                .await?
        }
        TransactionEventEnumType::Updated => {
            services
                .recorder
                .update_v201(charge_station_id, &req, samples)
                .await?
        }
        TransactionEventEnumType::Ended => {
            services
                .recorder
                .end_v201(charge_station_id, &req, samples)
                .await?
        }
    };
    to_response(&response)
}
