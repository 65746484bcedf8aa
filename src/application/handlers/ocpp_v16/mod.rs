//! OCPP 1.6 action handlers

use serde_json::Value;
use tracing::warn;

use super::{CallFailure, CallOutcome, OcppHandlerV16};

mod handle_boot_notification;
mod handle_heartbeat;
mod handle_meter_values;
mod handle_start_transaction;
mod handle_stop_transaction;

pub use handle_boot_notification::handle_boot_notification;
pub use handle_heartbeat::handle_heartbeat;
pub use handle_meter_values::handle_meter_values;
pub use handle_start_transaction::handle_start_transaction;
pub use handle_stop_transaction::handle_stop_transaction;

/// Route a station-initiated 1.6 action to its handler.
pub async fn action_matcher(handler: &OcppHandlerV16, action: &str, payload: &Value) -> CallOutcome {
    match action {
        "BootNotification" => handle_boot_notification(handler, payload).await,
        "Heartbeat" => handle_heartbeat(handler, payload).await,
        "MeterValues" => handle_meter_values(handler, payload).await,
        "StartTransaction" => handle_start_transaction(handler, payload).await,
        "StopTransaction" => handle_stop_transaction(handler, payload).await,
        unknown => {
            warn!(
                charge_station_id = handler.charge_station_id.as_str(),
                action = unknown,
                "Unsupported OCPP 1.6 action"
            );
            Err(CallFailure::not_implemented(unknown))
        }
    }
}
