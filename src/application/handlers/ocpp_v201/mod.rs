//! OCPP 2.0.1 action handlers

use serde_json::Value;
use tracing::warn;

use super::{CallFailure, CallOutcome, OcppHandlerV201};

mod handle_boot_notification;
mod handle_heartbeat;
mod handle_transaction_event;

pub use handle_boot_notification::handle_boot_notification;
pub use handle_heartbeat::handle_heartbeat;
pub use handle_transaction_event::handle_transaction_event;

/// Route a station-initiated 2.0.1 action to its handler.
pub async fn action_matcher(handler: &OcppHandlerV201, action: &str, payload: &Value) -> CallOutcome {
    match action {
        "BootNotification" => handle_boot_notification(handler, payload).await,
        "Heartbeat" => handle_heartbeat(handler, payload).await,
        "TransactionEvent" => handle_transaction_event(handler, payload).await,
        unknown => {
            warn!(
                charge_station_id = handler.charge_station_id.as_str(),
                action = unknown,
                "Unsupported OCPP 2.0.1 action"
            );
            Err(CallFailure::not_implemented(unknown))
        }
    }
}
