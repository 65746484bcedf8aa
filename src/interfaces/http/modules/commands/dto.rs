//! Command DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::commands::{CommandResponse, StartSession, StopSession};
use crate::application::ports::DisplayText;
use crate::interfaces::http::modules::tokens::TokenDto;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartSessionRequest {
    #[validate(url(message = "response_url must be a URL"))]
    pub response_url: String,
    #[validate(nested)]
    pub token: TokenDto,
    #[validate(length(min = 1, max = 36))]
    pub location_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 36))]
    pub evse_uid: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 36))]
    pub connector_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 36))]
    pub authorization_reference: Option<String>,
}

impl From<StartSessionRequest> for StartSession {
    fn from(request: StartSessionRequest) -> Self {
        Self {
            response_url: request.response_url,
            token: request.token.into(),
            location_id: request.location_id,
            evse_uid: request.evse_uid,
            connector_id: request.connector_id,
            authorization_reference: request.authorization_reference,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StopSessionRequest {
    #[validate(url(message = "response_url must be a URL"))]
    pub response_url: String,
    #[validate(length(min = 1, max = 36))]
    pub session_id: String,
}

impl From<StopSessionRequest> for StopSession {
    fn from(request: StopSessionRequest) -> Self {
        Self {
            response_url: request.response_url,
            session_id: request.session_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisplayTextDto {
    pub language: String,
    pub text: String,
}

impl From<DisplayText> for DisplayTextDto {
    fn from(text: DisplayText) -> Self {
        Self {
            language: text.language,
            text: text.text,
        }
    }
}

/// Synchronous answer to a command
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandResponseDto {
    /// `ACCEPTED`, `REJECTED`, `NOT_SUPPORTED` or `UNKNOWN_SESSION`
    pub result: String,
    /// Seconds to wait for the asynchronous result
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Vec<DisplayTextDto>>,
}

impl From<CommandResponse> for CommandResponseDto {
    fn from(response: CommandResponse) -> Self {
        Self {
            result: response.result.as_str().to_string(),
            timeout: response.timeout,
            message: response
                .message
                .map(|texts| texts.into_iter().map(DisplayTextDto::from).collect()),
        }
    }
}
