//! Delivery of asynchronous command results to `response_url`

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::model::{CommandOrigin, CommandType};
use crate::application::ports::{
    Callback, CallbackSender, CommandResult, CommandResultType, DisplayText,
};
use crate::domain::{PartyRole, StoreProvider};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// A command accepted for delivery whose result has not been reported yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AwaitingResult {
    pub command: CommandType,
    pub response_url: String,
    pub origin: CommandOrigin,
}

/// Map a station's CallResult payload onto an OCPI result. Every remote
/// start/stop response in 1.6 and 2.0.1 carries a `status` field.
pub fn result_from_payload(payload: &Value) -> CommandResult {
    match payload.get("status").and_then(Value::as_str) {
        Some("Accepted") => CommandResult {
            result: CommandResultType::Accepted,
            message: None,
        },
        Some("Rejected") => CommandResult {
            result: CommandResultType::Rejected,
            message: None,
        },
        Some(other) => failed(format!("unexpected status {other}")),
        None => failed("unparsable station response"),
    }
}

pub fn failed(text: impl Into<String>) -> CommandResult {
    CommandResult {
        result: CommandResultType::Failed,
        message: Some(vec![DisplayText::en(text)]),
    }
}

pub fn timed_out() -> CommandResult {
    CommandResult {
        result: CommandResultType::Timeout,
        message: Some(vec![DisplayText::en("no response from charge station")]),
    }
}

pub struct ResultNotifier {
    sender: Arc<dyn CallbackSender>,
    stores: Arc<dyn StoreProvider>,
    retry: RetryConfig,
}

impl ResultNotifier {
    pub fn new(
        sender: Arc<dyn CallbackSender>,
        stores: Arc<dyn StoreProvider>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            sender,
            stores,
            retry,
        }
    }

    /// Deliver in the background; the caller is usually a station's
    /// receive loop and must not wait on the roaming platform.
    pub fn notify(self: &Arc<Self>, awaiting: AwaitingResult, result: CommandResult) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.deliver(awaiting, result).await;
        });
    }

    pub async fn deliver(&self, awaiting: AwaitingResult, result: CommandResult) {
        let requester = &awaiting.origin.requester;
        let party = match self
            .stores
            .parties()
            .get_party_details(PartyRole::Emsp, &requester.country_code, &requester.party_id)
            .await
        {
            Ok(party) => party,
            Err(e) => {
                warn!(error = %e, "Party lookup failed, sending callback without credentials");
                None
            }
        };

        let callback = Callback {
            response_url: awaiting.response_url.clone(),
            correlation_id: awaiting.origin.correlation_id.clone(),
            // the callback flows back, so from/to swap
            from_country_code: awaiting.origin.to_country_code.clone(),
            from_party_id: awaiting.origin.to_party_id.clone(),
            to_country_code: requester.country_code.clone(),
            to_party_id: requester.party_id.clone(),
            party,
            body: result,
        };
        let result_label = callback.body.result.as_str();

        let outcome = retry_with_backoff(
            self.retry.clone(),
            || self.sender.send(&callback),
            |e| e.is_transient(),
            "ocpi_callback",
        )
        .await;

        let delivery = match &outcome {
            Ok(()) => {
                info!(
                    command = %awaiting.command,
                    result = result_label,
                    response_url = callback.response_url.as_str(),
                    "Command result delivered"
                );
                "delivered"
            }
            Err(e) => {
                warn!(
                    command = %awaiting.command,
                    result = result_label,
                    response_url = callback.response_url.as_str(),
                    error = %e,
                    "Command result could not be delivered"
                );
                "failed"
            }
        };
        metrics::counter!(
            "ocpi_callbacks_total",
            "result" => result_label,
            "delivery" => delivery
        )
        .increment(1);
    }
}
