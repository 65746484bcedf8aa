//! OCPP-J message framing
//!
//! The envelope is the same for OCPP 1.6 and 2.0.1:
//!
//! - **Call**       `[2, "<uniqueId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<uniqueId>", {<payload>}]`
//! - **CallError**  `[4, "<uniqueId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`

use std::fmt;

use serde_json::{json, Value};

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

/// CallError codes the bridge produces towards charge stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcppErrorCode {
    NotImplemented,
    FormationViolation,
    InternalError,
    ProtocolError,
}

impl OcppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotImplemented => "NotImplemented",
            // 1.6 spells it "FormationViolation", 2.0.1 "FormatViolation";
            // stations of both generations accept the 1.6 spelling.
            Self::FormationViolation => "FormationViolation",
            Self::InternalError => "InternalError",
            Self::ProtocolError => "ProtocolError",
        }
    }
}

/// A parsed OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    Call {
        unique_id: String,
        action: String,
        payload: Value,
    },
    CallResult {
        unique_id: String,
        payload: Value,
    },
    CallError {
        unique_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

impl OcppFrame {
    pub fn parse(text: &str) -> Result<Self, OcppFrameError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| OcppFrameError::InvalidJson(e.to_string()))?;
        let arr = value.as_array().ok_or(OcppFrameError::NotAnArray)?;

        let msg_type = arr
            .first()
            .ok_or(OcppFrameError::NotAnArray)?
            .as_u64()
            .ok_or(OcppFrameError::InvalidMessageType)?;

        let min_len = match msg_type {
            MSG_TYPE_CALL => 4,
            MSG_TYPE_CALL_RESULT => 3,
            MSG_TYPE_CALL_ERROR => 4,
            other => return Err(OcppFrameError::UnknownMessageType(other)),
        };
        if arr.len() < min_len {
            return Err(OcppFrameError::MissingFields {
                expected: min_len,
                got: arr.len(),
            });
        }

        let unique_id = string_at(arr, 1, "uniqueId must be a string")?;

        let frame = match msg_type {
            MSG_TYPE_CALL => Self::Call {
                unique_id,
                action: string_at(arr, 2, "action must be a string")?,
                payload: arr[3].clone(),
            },
            MSG_TYPE_CALL_RESULT => Self::CallResult {
                unique_id,
                payload: arr[2].clone(),
            },
            _ => Self::CallError {
                unique_id,
                error_code: string_at(arr, 2, "errorCode must be a string")?,
                error_description: arr
                    .get(3)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                error_details: arr.get(4).cloned().unwrap_or_else(|| json!({})),
            },
        };
        Ok(frame)
    }

    pub fn serialize(&self) -> String {
        let arr = match self {
            Self::Call {
                unique_id,
                action,
                payload,
            } => json!([MSG_TYPE_CALL, unique_id, action, payload]),
            Self::CallResult { unique_id, payload } => {
                json!([MSG_TYPE_CALL_RESULT, unique_id, payload])
            }
            Self::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => json!([
                MSG_TYPE_CALL_ERROR,
                unique_id,
                error_code,
                error_description,
                error_details
            ]),
        };
        arr.to_string()
    }

    pub fn unique_id(&self) -> &str {
        match self {
            Self::Call { unique_id, .. }
            | Self::CallResult { unique_id, .. }
            | Self::CallError { unique_id, .. } => unique_id,
        }
    }

    pub fn result(unique_id: impl Into<String>, payload: Value) -> Self {
        Self::CallResult {
            unique_id: unique_id.into(),
            payload,
        }
    }

    pub fn error(
        unique_id: impl Into<String>,
        code: OcppErrorCode,
        description: impl Into<String>,
    ) -> Self {
        Self::CallError {
            unique_id: unique_id.into(),
            error_code: code.as_str().to_string(),
            error_description: description.into(),
            error_details: json!({}),
        }
    }
}

fn string_at(arr: &[Value], idx: usize, what: &'static str) -> Result<String, OcppFrameError> {
    arr[idx]
        .as_str()
        .map(str::to_string)
        .ok_or(OcppFrameError::FieldTypeMismatch(what))
}

#[derive(Debug, PartialEq)]
pub enum OcppFrameError {
    InvalidJson(String),
    NotAnArray,
    InvalidMessageType,
    UnknownMessageType(u64),
    MissingFields { expected: usize, got: usize },
    FieldTypeMismatch(&'static str),
}

impl fmt::Display for OcppFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "Invalid JSON: {}", msg),
            Self::NotAnArray => write!(f, "OCPP message is not a non-empty array"),
            Self::InvalidMessageType => write!(f, "Message type is not a number"),
            Self::UnknownMessageType(t) => write!(f, "Unknown message type: {}", t),
            Self::MissingFields { expected, got } => {
                write!(f, "Expected at least {} fields, got {}", expected, got)
            }
            Self::FieldTypeMismatch(msg) => write!(f, "Field type mismatch: {}", msg),
        }
    }
}

impl std::error::Error for OcppFrameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_transaction_call() {
        let text = r#"[2,"19223201","StartTransaction",{"connectorId":1,"idTag":"DEADBEEF","meterStart":100,"timestamp":"2024-01-01T00:00:00Z"}]"#;
        match OcppFrame::parse(text).unwrap() {
            OcppFrame::Call {
                unique_id,
                action,
                payload,
            } => {
                assert_eq!(unique_id, "19223201");
                assert_eq!(action, "StartTransaction");
                assert_eq!(payload["idTag"], "DEADBEEF");
            }
            other => panic!("Expected Call frame, got {:?}", other),
        }
    }

    #[test]
    fn parse_call_result() {
        let text = r#"[3,"abc123",{"status":"Accepted"}]"#;
        let frame = OcppFrame::parse(text).unwrap();
        assert_eq!(
            frame,
            OcppFrame::result("abc123", json!({"status": "Accepted"}))
        );
    }

    #[test]
    fn parse_call_error_without_details() {
        let text = r#"[4,"abc123","NotImplemented","Action not supported"]"#;
        match OcppFrame::parse(text).unwrap() {
            OcppFrame::CallError {
                error_code,
                error_description,
                error_details,
                ..
            } => {
                assert_eq!(error_code, "NotImplemented");
                assert_eq!(error_description, "Action not supported");
                assert_eq!(error_details, json!({}));
            }
            other => panic!("Expected CallError frame, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(
            OcppFrame::parse("not json"),
            Err(OcppFrameError::InvalidJson(_))
        ));
        assert_eq!(OcppFrame::parse("[]"), Err(OcppFrameError::NotAnArray));
        assert_eq!(
            OcppFrame::parse(r#"[9,"x"]"#),
            Err(OcppFrameError::UnknownMessageType(9))
        );
        assert_eq!(
            OcppFrame::parse(r#"[2,"x","Heartbeat"]"#),
            Err(OcppFrameError::MissingFields {
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            OcppFrame::parse(r#"[2,7,"Heartbeat",{}]"#),
            Err(OcppFrameError::FieldTypeMismatch("uniqueId must be a string"))
        );
    }

    #[test]
    fn serialized_error_is_parseable() {
        let frame = OcppFrame::error("id3", OcppErrorCode::InternalError, "store down");
        let text = frame.serialize();
        assert!(text.starts_with(r#"[4,"id3","InternalError""#));
        assert_eq!(OcppFrame::parse(&text).unwrap(), frame);
    }
}
