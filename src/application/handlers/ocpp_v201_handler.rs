//! OCPP 2.0.1 message handler
//!
//! Same envelope as 1.6; only the action set differs.

use serde_json::Value;
use tracing::{debug, error, info};

use super::{reply, resolve_response, SharedInboundServices};
use crate::application::handlers::ocpp_v201::action_matcher;
use crate::shared::ocpp_frame::OcppFrame;

/// Handler for OCPP 2.0.1 messages
pub struct OcppHandlerV201 {
    pub charge_station_id: String,
    pub services: SharedInboundServices,
}

impl OcppHandlerV201 {
    pub fn new(charge_station_id: impl Into<String>, services: SharedInboundServices) -> Self {
        Self {
            charge_station_id: charge_station_id.into(),
            services,
        }
    }

    pub async fn handle(&self, text: &str) -> Option<String> {
        debug!(
            charge_station_id = self.charge_station_id.as_str(),
            "V201 received raw message: {}", text
        );

        let frame = match OcppFrame::parse(text) {
            Ok(f) => f,
            Err(e) => {
                error!(
                    charge_station_id = self.charge_station_id.as_str(),
                    error = %e,
                    raw = text,
                    "V201 failed to parse OCPP message"
                );
                return None;
            }
        };

        match frame {
            OcppFrame::Call {
                unique_id,
                action,
                payload,
            } => Some(self.handle_call(&unique_id, &action, payload).await),
            response => {
                resolve_response(&self.services.pending, &self.charge_station_id, response);
                None
            }
        }
    }

    async fn handle_call(&self, unique_id: &str, action: &str, payload: Value) -> String {
        info!(
            charge_station_id = self.charge_station_id.as_str(),
            action,
            "V201 received Call"
        );
        let outcome = action_matcher(self, action, &payload).await;
        reply(&self.charge_station_id, unique_id, action, outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::application::commands::callback::tests::{awaiting, RecordingCallbackSender};
    use crate::application::commands::{CommandType, PendingCommands, ResultNotifier};
    use crate::application::handlers::InboundServices;
    use crate::application::ports::CommandResultType;
    use crate::application::transactions::{TransactionAuthorizer, TransactionRecorder};
    use crate::domain::TransactionStore;
    use crate::infrastructure::storage::InMemoryStore;
    use crate::shared::retry::RetryConfig;

    fn handler() -> (OcppHandlerV201, Arc<InMemoryStore>, Arc<RecordingCallbackSender>) {
        let store = Arc::new(InMemoryStore::new());
        let sender = Arc::new(RecordingCallbackSender::default());
        let notifier = Arc::new(ResultNotifier::new(
            sender.clone(),
            store.clone(),
            RetryConfig::with_attempts(1),
        ));
        let services = Arc::new(InboundServices {
            authorizer: TransactionAuthorizer::new(store.clone()),
            recorder: TransactionRecorder::new(store.clone()),
            pending: Arc::new(PendingCommands::new(notifier)),
        });
        (OcppHandlerV201::new("CS201", services), store, sender)
    }

    #[tokio::test]
    async fn started_without_id_token_is_persisted() {
        let (handler, store, _) = handler();
        let reply = handler
            .handle(r#"[2,"e1","TransactionEvent",{"eventType":"Started","timestamp":"2024-01-01T00:00:00Z","triggerReason":"CablePluggedIn","seqNo":0,"transactionInfo":{"transactionId":"abc-1"}}]"#)
            .await
            .unwrap();

        match OcppFrame::parse(&reply).unwrap() {
            OcppFrame::CallResult { payload, .. } => {
                assert!(payload.get("idTokenInfo").is_none())
            }
            other => panic!("Expected CallResult, got {:?}", other),
        }
        assert!(store
            .lookup_transaction("CS201", "abc-1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn started_with_unknown_token_is_invalid() {
        let (handler, _, _) = handler();
        let reply = handler
            .handle(r#"[2,"e2","TransactionEvent",{"eventType":"Started","timestamp":"2024-01-01T00:00:00Z","triggerReason":"Authorized","seqNo":0,"transactionInfo":{"transactionId":"abc-2"},"idToken":{"idToken":"NOPE","type":"ISO14443"}}]"#)
            .await
            .unwrap();
        match OcppFrame::parse(&reply).unwrap() {
            OcppFrame::CallResult { payload, .. } => {
                assert_eq!(payload["idTokenInfo"]["status"], "Invalid")
            }
            other => panic!("Expected CallResult, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn v16_only_action_is_not_implemented() {
        let (handler, _, _) = handler();
        let reply = handler
            .handle(r#"[2,"e3","StartTransaction",{}]"#)
            .await
            .unwrap();
        match OcppFrame::parse(&reply).unwrap() {
            OcppFrame::CallError { error_code, .. } => assert_eq!(error_code, "NotImplemented"),
            other => panic!("Expected CallError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn call_error_fails_pending_command() {
        let (handler, _, sender) = handler();
        handler.services.pending.register(
            "CS201",
            "cmd-9",
            awaiting(CommandType::StopSession),
            Duration::from_secs(30),
        );

        handler
            .handle(r#"[4,"cmd-9","InternalError","boom",{}]"#)
            .await;

        let sent = sender.wait_for(1).await;
        assert_eq!(sent[0].body.result, CommandResultType::Failed);
    }
}
