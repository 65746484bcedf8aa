//! OCPP 1.6 message handler
//!
//! Parses raw OCPP-J frames, dispatches Calls to action handlers and hands
//! CallResult / CallError frames to the pending command registry.

use serde_json::Value;
use tracing::{debug, error, info};

use super::{reply, resolve_response, SharedInboundServices};
use crate::application::handlers::ocpp_v16::action_matcher;
use crate::shared::ocpp_frame::OcppFrame;

/// Handler for OCPP 1.6 messages
pub struct OcppHandlerV16 {
    pub charge_station_id: String,
    pub services: SharedInboundServices,
}

impl OcppHandlerV16 {
    pub fn new(charge_station_id: impl Into<String>, services: SharedInboundServices) -> Self {
        Self {
            charge_station_id: charge_station_id.into(),
            services,
        }
    }

    /// Returns the frame to send back, if any.
    pub async fn handle(&self, text: &str) -> Option<String> {
        debug!(
            charge_station_id = self.charge_station_id.as_str(),
            "Received raw message: {}", text
        );

        let frame = match OcppFrame::parse(text) {
            Ok(f) => f,
            Err(e) => {
                error!(
                    charge_station_id = self.charge_station_id.as_str(),
                    error = %e,
                    raw = text,
                    "Failed to parse OCPP message"
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
            "Received Call"
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
    use crate::domain::{Token, TokenStore, TransactionStore};
    use crate::domain::transaction::transaction_uuid;
    use crate::infrastructure::storage::InMemoryStore;
    use crate::shared::retry::RetryConfig;
    use serde_json::json;

    struct Fixture {
        handler: OcppHandlerV16,
        store: Arc<InMemoryStore>,
        sender: Arc<RecordingCallbackSender>,
    }

    fn fixture() -> Fixture {
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
        Fixture {
            handler: OcppHandlerV16::new("CS16", services),
            store,
            sender,
        }
    }

    fn parse(text: &str) -> OcppFrame {
        OcppFrame::parse(text).unwrap()
    }

    #[tokio::test]
    async fn start_transaction_with_known_token() {
        let f = fixture();
        let token: Token = serde_json::from_value(json!({
            "country_code": "GB", "party_id": "TWK", "uid": "DEADBEEF",
            "type": "RFID", "contract_id": "C1", "issuer": "I",
            "valid": true, "whitelist": "ALWAYS", "last_updated": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        f.store.set_token(token).await.unwrap();

        let reply = f
            .handler
            .handle(r#"[2,"m1","StartTransaction",{"connectorId":1,"idTag":"DEADBEEF","meterStart":100,"timestamp":"2024-01-01T00:00:00Z"}]"#)
            .await
            .unwrap();

        match parse(&reply) {
            OcppFrame::CallResult { unique_id, payload } => {
                assert_eq!(unique_id, "m1");
                assert_eq!(payload["idTagInfo"]["status"], "Accepted");
                let id = payload["transactionId"].as_i64().unwrap();
                assert!(id >= 0);
                let tx = f
                    .store
                    .lookup_transaction("CS16", &transaction_uuid(id as i32).to_string())
                    .await
                    .unwrap();
                assert!(tx.is_some());
            }
            other => panic!("Expected CallResult, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_action_is_not_implemented() {
        let f = fixture();
        let reply = f
            .handler
            .handle(r#"[2,"m2","DataTransfer",{"vendorId":"x"}]"#)
            .await
            .unwrap();
        match parse(&reply) {
            OcppFrame::CallError { error_code, .. } => assert_eq!(error_code, "NotImplemented"),
            other => panic!("Expected CallError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_formation_violation() {
        let f = fixture();
        let reply = f
            .handler
            .handle(r#"[2,"m3","StartTransaction",{"connectorId":"one"}]"#)
            .await
            .unwrap();
        match parse(&reply) {
            OcppFrame::CallError { error_code, .. } => {
                assert_eq!(error_code, "FormationViolation")
            }
            other => panic!("Expected CallError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn boot_notification_is_accepted() {
        let f = fixture();
        let reply = f
            .handler
            .handle(r#"[2,"m4","BootNotification",{"chargePointVendor":"V","chargePointModel":"M"}]"#)
            .await
            .unwrap();
        match parse(&reply) {
            OcppFrame::CallResult { payload, .. } => {
                assert_eq!(payload["status"], "Accepted");
                assert_eq!(payload["interval"], 300);
            }
            other => panic!("Expected CallResult, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn call_result_resolves_pending_command() {
        let f = fixture();
        f.handler.services.pending.register(
            "CS16",
            "cmd-1",
            awaiting(CommandType::StartSession),
            Duration::from_secs(30),
        );

        let reply = f.handler.handle(r#"[3,"cmd-1",{"status":"Accepted"}]"#).await;

        assert!(reply.is_none());
        assert!(f.handler.services.pending.is_empty());
        let sent = f.sender.wait_for(1).await;
        assert_eq!(sent[0].body.result, CommandResultType::Accepted);
    }

    #[tokio::test]
    async fn garbage_is_ignored() {
        let f = fixture();
        assert!(f.handler.handle("not a frame").await.is_none());
    }
}
