//! Token DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{CacheMode, Token, TokenPatch, TokenType};

/// OCPI Token object
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TokenDto {
    #[validate(length(equal = 2))]
    pub country_code: String,
    #[validate(length(equal = 3))]
    pub party_id: String,
    /// Joins with the OCPP `idTag` / `idToken`
    #[validate(length(min = 1, max = 36))]
    pub uid: String,
    /// `AD_HOC_USER`, `APP_USER`, `OTHER` or `RFID`
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "RFID")]
    pub token_type: TokenType,
    #[validate(length(min = 1, max = 36))]
    pub contract_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub visual_number: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 36))]
    pub group_id: Option<String>,
    pub valid: bool,
    /// `ALWAYS`, `ALLOWED`, `ALLOWED_OFFLINE` or `NEVER`
    #[schema(value_type = String, example = "ALLOWED")]
    pub whitelist: CacheMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 2))]
    pub language: Option<String>,
    /// Ignored on input; the store stamps the write time.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<Token> for TokenDto {
    fn from(token: Token) -> Self {
        Self {
            country_code: token.country_code,
            party_id: token.party_id,
            uid: token.uid,
            token_type: token.token_type,
            contract_id: token.contract_id,
            visual_number: token.visual_number,
            issuer: token.issuer,
            group_id: token.group_id,
            valid: token.valid,
            whitelist: token.cache_mode,
            language: token.language,
            last_updated: Some(token.last_updated),
        }
    }
}

impl From<TokenDto> for Token {
    fn from(dto: TokenDto) -> Self {
        Self {
            country_code: dto.country_code,
            party_id: dto.party_id,
            uid: dto.uid,
            token_type: dto.token_type,
            contract_id: dto.contract_id,
            visual_number: dto.visual_number,
            issuer: dto.issuer,
            group_id: dto.group_id,
            valid: dto.valid,
            cache_mode: dto.whitelist,
            language: dto.language,
            last_updated: dto.last_updated.unwrap_or_else(Utc::now),
        }
    }
}

/// Partial Token update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct TokenPatchDto {
    #[serde(default, rename = "type")]
    #[schema(value_type = Option<String>)]
    pub token_type: Option<TokenType>,
    #[serde(default)]
    #[validate(length(min = 1, max = 36))]
    pub contract_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub issuer: Option<String>,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub whitelist: Option<CacheMode>,
}

impl From<TokenPatchDto> for TokenPatch {
    fn from(dto: TokenPatchDto) -> Self {
        Self {
            token_type: dto.token_type,
            contract_id: dto.contract_id,
            issuer: dto.issuer,
            valid: dto.valid,
            cache_mode: dto.whitelist,
        }
    }
}
