//! Outbound ports
//!
//! [`Emitter`] hands OCPP Calls to a charge station's transport channel;
//! [`CallbackSender`] posts asynchronous command results to a roaming
//! platform's `response_url`. The production implementations live in
//! `infrastructure`; tests use recording fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{OcpiParty, OcppVersion};
use crate::shared::errors::{CallbackError, EmitError};
use crate::shared::ocpp_frame::OcppFrame;

/// An outbound OCPP Call, ready for framing.
#[derive(Debug, Clone, PartialEq)]
pub struct OcppCall {
    pub message_id: String,
    pub action: &'static str,
    pub payload: Value,
}

impl OcppCall {
    pub fn frame(&self) -> OcppFrame {
        OcppFrame::Call {
            unique_id: self.message_id.clone(),
            action: self.action.to_string(),
            payload: self.payload.clone(),
        }
    }
}

/// Fire-and-forget delivery of a Call. `Ok` means the Call was accepted for
/// delivery, not that the station received it.
#[async_trait]
pub trait Emitter: Send + Sync {
    async fn emit(
        &self,
        charge_station_id: &str,
        version: OcppVersion,
        call: &OcppCall,
    ) -> Result<(), EmitError>;
}

/// Final outcome of a command, as reported to the roaming platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResultType {
    Accepted,
    Rejected,
    Failed,
    Timeout,
}

impl CommandResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayText {
    pub language: String,
    pub text: String,
}

impl DisplayText {
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            language: "en".to_string(),
            text: text.into(),
        }
    }
}

/// Body of the POST to `response_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub result: CommandResultType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Vec<DisplayText>>,
}

/// Everything needed to deliver one command result.
#[derive(Debug, Clone, PartialEq)]
pub struct Callback {
    pub response_url: String,
    pub correlation_id: String,
    pub from_country_code: String,
    pub from_party_id: String,
    pub to_country_code: String,
    pub to_party_id: String,
    /// Outbound credentials of the requesting party, when known.
    pub party: Option<OcpiParty>,
    pub body: CommandResult,
}

#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send(&self, callback: &Callback) -> Result<(), CallbackError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_result_body() {
        let body = CommandResult {
            result: CommandResultType::Timeout,
            message: Some(vec![DisplayText::en("no answer")]),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"result": "TIMEOUT", "message": [{"language": "en", "text": "no answer"}]})
        );
        let bare = CommandResult {
            result: CommandResultType::Accepted,
            message: None,
        };
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({"result": "ACCEPTED"}));
    }

    #[test]
    fn call_frames_as_ocpp_call() {
        let call = OcppCall {
            message_id: "m1".into(),
            action: "RemoteStartTransaction",
            payload: json!({"idTag": "X"}),
        };
        assert_eq!(
            call.frame().serialize(),
            r#"[2,"m1","RemoteStartTransaction",{"idTag":"X"}]"#
        );
    }
}
