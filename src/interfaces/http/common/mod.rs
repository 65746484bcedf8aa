//! Shared pieces of the OCPI HTTP surface: the response envelope, the
//! validated JSON extractor and the identity this platform presents.

pub mod validated_json;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use validated_json::{parse_validated, ValidatedJson};

/// OCPI status codes used by this platform.
pub mod status {
    pub const SUCCESS: u16 = 1000;
    pub const CLIENT_ERROR: u16 = 2000;
    pub const INVALID_PARAMETERS: u16 = 2001;
    pub const UNKNOWN_TOKEN: u16 = 2004;
    pub const SERVER_ERROR: u16 = 3000;
}

/// OCPI response envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcpiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: status::SUCCESS,
            status_message: Some("Success".to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            status_code,
            status_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

impl OcpiResponse<()> {
    /// Success without a body, as returned by PUT and PATCH.
    pub fn empty() -> Self {
        Self {
            data: None,
            status_code: status::SUCCESS,
            status_message: Some("Success".to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// How this platform identifies itself to roaming partners.
#[derive(Debug, Clone)]
pub struct OcpiIdentity {
    pub country_code: String,
    pub party_id: String,
    /// Public base URL the OCPI endpoints are reachable under.
    pub base_url: String,
}

impl OcpiIdentity {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
