//! OCPI command types as the dispatcher sees them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::application::auth::PartyContext;
use crate::application::ports::DisplayText;
use crate::domain::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    CancelReservation,
    ReserveNow,
    StartSession,
    StopSession,
    UnlockConnector,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CancelReservation => "CANCEL_RESERVATION",
            Self::ReserveNow => "RESERVE_NOW",
            Self::StartSession => "START_SESSION",
            Self::StopSession => "STOP_SESSION",
            Self::UnlockConnector => "UNLOCK_CONNECTOR",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANCEL_RESERVATION" => Ok(Self::CancelReservation),
            "RESERVE_NOW" => Ok(Self::ReserveNow),
            "START_SESSION" => Ok(Self::StartSession),
            "STOP_SESSION" => Ok(Self::StopSession),
            "UNLOCK_CONNECTOR" => Ok(Self::UnlockConnector),
            other => Err(format!("unknown command type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartSession {
    pub response_url: String,
    pub token: Token,
    pub location_id: String,
    pub evse_uid: Option<String>,
    pub connector_id: Option<String>,
    pub authorization_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSession {
    pub response_url: String,
    pub session_id: String,
}

/// Who asked for a command, and how to address the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOrigin {
    pub requester: PartyContext,
    pub to_country_code: String,
    pub to_party_id: String,
    pub correlation_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResponseType {
    Accepted,
    Rejected,
    NotSupported,
    UnknownSession,
}

impl CommandResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::UnknownSession => "UNKNOWN_SESSION",
        }
    }
}

/// Synchronous acknowledgement of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub result: CommandResponseType,
    /// Seconds the caller should wait for the asynchronous result.
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Vec<DisplayText>>,
}

impl CommandResponse {
    pub fn new(result: CommandResponseType, timeout: u64) -> Self {
        Self {
            result,
            timeout,
            message: None,
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(vec![DisplayText::en(text)]);
        self
    }
}
