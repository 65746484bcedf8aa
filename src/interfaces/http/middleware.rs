//! OCPI credentials middleware for Axum
//!
//! Runs before any handler. On success the caller's [`PartyContext`] is
//! inserted into the request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use crate::application::auth::{AuthGateway, Credentials, PartyContext};

pub const FROM_COUNTRY_CODE_HEADER: &str = "ocpi-from-country-code";
pub const FROM_PARTY_ID_HEADER: &str = "ocpi-from-party-id";
pub const TO_COUNTRY_CODE_HEADER: &str = "ocpi-to-country-code";
pub const TO_PARTY_ID_HEADER: &str = "ocpi-to-party-id";

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn authorize(
    gateway: &AuthGateway,
    mut request: Request<Body>,
    next: Next,
    require_party: bool,
) -> Response {
    let headers = request.headers();
    let credentials = Credentials {
        authorization: header_str(headers, header::AUTHORIZATION.as_str()),
        from_country_code: header_str(headers, FROM_COUNTRY_CODE_HEADER),
        from_party_id: header_str(headers, FROM_PARTY_ID_HEADER),
    };

    let party: PartyContext = match gateway.authenticate(credentials, require_party).await {
        Ok(party) => party,
        Err(e) => return ApiError::from(e).into_response(),
    };
    request.extensions_mut().insert(party);
    next.run(request).await
}

/// Version discovery: token required, from-party headers optional.
pub async fn ocpi_discovery_auth(
    State(gateway): State<Arc<AuthGateway>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    authorize(&gateway, request, next, false).await
}

/// Module endpoints: token and from-party headers required.
pub async fn ocpi_module_auth(
    State(gateway): State<Arc<AuthGateway>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    authorize(&gateway, request, next, true).await
}
