//! Token receiver handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::info;

use super::dto::{TokenDto, TokenPatchDto};
use crate::application::auth::PartyContext;
use crate::domain::{StoreProvider, Token};
use crate::interfaces::http::common::{OcpiResponse, ValidatedJson};
use crate::interfaces::http::error::{ApiError, ApiResult};
use crate::shared::errors::BridgeError;

/// Token handler state
#[derive(Clone)]
pub struct TokensState {
    pub stores: Arc<dyn StoreProvider>,
}

async fn find_token(
    state: &TokensState,
    country_code: &str,
    party_id: &str,
    uid: &str,
) -> ApiResult<Token> {
    state
        .stores
        .tokens()
        .lookup_token(uid)
        .await
        .map_err(BridgeError::from)?
        .filter(|token| token.is_owned_by(country_code, party_id))
        .ok_or_else(|| ApiError::UnknownToken(uid.to_string()))
}

#[utoipa::path(
    get,
    path = "/ocpi/receiver/2.2/tokens/{country_code}/{party_id}/{uid}",
    tag = "Tokens",
    security(("ocpi_token" = [])),
    params(
        ("country_code" = String, Path, description = "Country code of the eMSP owning the token"),
        ("party_id" = String, Path, description = "Party id of the eMSP owning the token"),
        ("uid" = String, Path, description = "Token uid")
    ),
    responses(
        (status = 200, description = "Stored token", body = OcpiResponse<TokenDto>),
        (status = 404, description = "Unknown token (OCPI 2004)")
    )
)]
pub async fn get_token(
    State(state): State<TokensState>,
    Path((country_code, party_id, uid)): Path<(String, String, String)>,
) -> ApiResult<Json<OcpiResponse<TokenDto>>> {
    let token = find_token(&state, &country_code, &party_id, &uid).await?;
    Ok(Json(OcpiResponse::success(TokenDto::from(token))))
}

#[utoipa::path(
    put,
    path = "/ocpi/receiver/2.2/tokens/{country_code}/{party_id}/{uid}",
    tag = "Tokens",
    security(("ocpi_token" = [])),
    params(
        ("country_code" = String, Path, description = "Country code of the eMSP owning the token"),
        ("party_id" = String, Path, description = "Party id of the eMSP owning the token"),
        ("uid" = String, Path, description = "Token uid")
    ),
    request_body = TokenDto,
    responses(
        (status = 200, description = "Token stored"),
        (status = 400, description = "Invalid token or path/body mismatch (OCPI 2001)")
    )
)]
pub async fn put_token(
    State(state): State<TokensState>,
    Extension(party): Extension<PartyContext>,
    Path((country_code, party_id, uid)): Path<(String, String, String)>,
    ValidatedJson(body): ValidatedJson<TokenDto>,
) -> ApiResult<Json<OcpiResponse<()>>> {
    if !body.country_code.eq_ignore_ascii_case(&country_code)
        || !body.party_id.eq_ignore_ascii_case(&party_id)
        || body.uid != uid
    {
        return Err(BridgeError::Validation(
            "country_code, party_id and uid must match the request path".into(),
        )
        .into());
    }

    state
        .stores
        .tokens()
        .set_token(Token::from(body))
        .await
        .map_err(BridgeError::from)?;

    info!(
        uid = uid.as_str(),
        owner = %format!("{country_code}/{party_id}"),
        sender = %format!("{}/{}", party.country_code, party.party_id),
        "Token stored"
    );
    Ok(Json(OcpiResponse::empty()))
}

#[utoipa::path(
    patch,
    path = "/ocpi/receiver/2.2/tokens/{country_code}/{party_id}/{uid}",
    tag = "Tokens",
    security(("ocpi_token" = [])),
    params(
        ("country_code" = String, Path, description = "Country code of the eMSP owning the token"),
        ("party_id" = String, Path, description = "Party id of the eMSP owning the token"),
        ("uid" = String, Path, description = "Token uid")
    ),
    request_body = TokenPatchDto,
    responses(
        (status = 200, description = "Token updated"),
        (status = 404, description = "Unknown token (OCPI 2004)")
    )
)]
pub async fn patch_token(
    State(state): State<TokensState>,
    Path((country_code, party_id, uid)): Path<(String, String, String)>,
    ValidatedJson(body): ValidatedJson<TokenPatchDto>,
) -> ApiResult<Json<OcpiResponse<()>>> {
    state
        .stores
        .tokens()
        .patch_token(&country_code, &party_id, &uid, body.into())
        .await
        .map_err(BridgeError::from)?
        .ok_or_else(|| ApiError::UnknownToken(uid.clone()))?;

    info!(uid = uid.as_str(), "Token updated");
    Ok(Json(OcpiResponse::empty()))
}
