use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OCPI token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    AdHocUser,
    AppUser,
    Other,
    Rfid,
}

/// OCPI whitelist setting: how a CPO may authorize the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheMode {
    Always,
    Allowed,
    AllowedOffline,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub country_code: String,
    pub party_id: String,
    pub uid: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub contract_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_number: Option<String>,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub valid: bool,
    #[serde(rename = "whitelist")]
    pub cache_mode: CacheMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// Partial update accepted by the token module's PATCH operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPatch {
    pub token_type: Option<TokenType>,
    pub contract_id: Option<String>,
    pub issuer: Option<String>,
    pub valid: Option<bool>,
    pub cache_mode: Option<CacheMode>,
}

impl Token {
    pub fn is_owned_by(&self, country_code: &str, party_id: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(country_code)
            && self.party_id.eq_ignore_ascii_case(party_id)
    }

    pub fn apply(&mut self, patch: TokenPatch) {
        if let Some(token_type) = patch.token_type {
            self.token_type = token_type;
        }
        if let Some(contract_id) = patch.contract_id {
            self.contract_id = contract_id;
        }
        if let Some(issuer) = patch.issuer {
            self.issuer = issuer;
        }
        if let Some(valid) = patch.valid {
            self.valid = valid;
        }
        if let Some(cache_mode) = patch.cache_mode {
            self.cache_mode = cache_mode;
        }
        self.last_updated = Utc::now();
    }
}
