//! OCPI credentials check
//!
//! Every OCPI request carries `Authorization: Token <value>`. The value must
//! belong to a Registered partner, and a declared `OCPI-from-*` party must
//! be the owner of that registration.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::domain::{RoamingCredential, StoreProvider};
use crate::shared::errors::{BridgeError, BridgeResult};

/// Authenticated OCPI caller, attached to the request by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyContext {
    pub country_code: String,
    pub party_id: String,
    pub token: String,
}

/// Headers relevant to authentication, as received.
#[derive(Debug, Default, Clone, Copy)]
pub struct Credentials<'a> {
    pub authorization: Option<&'a str>,
    pub from_country_code: Option<&'a str>,
    pub from_party_id: Option<&'a str>,
}

pub struct AuthGateway {
    stores: Arc<dyn StoreProvider>,
}

impl AuthGateway {
    pub fn new(stores: Arc<dyn StoreProvider>) -> Self {
        Self { stores }
    }

    /// `require_party` is set for module endpoints, where the from-party
    /// headers are mandatory.
    pub async fn authenticate(
        &self,
        credentials: Credentials<'_>,
        require_party: bool,
    ) -> BridgeResult<PartyContext> {
        let header = credentials
            .authorization
            .ok_or_else(|| BridgeError::Unauthorized("missing Authorization header".into()))?;
        let token = extract_token(header)
            .ok_or_else(|| BridgeError::Unauthorized("expected Token authorization".into()))?;

        let credential = self
            .lookup(token)
            .await?
            .ok_or_else(|| BridgeError::Unauthorized("unknown credentials token".into()))?;

        if !credential.is_registered() {
            warn!(
                country_code = credential.country_code.as_str(),
                party_id = credential.party_id.as_str(),
                "Credentials token used before registration completed"
            );
            return Err(BridgeError::Unauthorized("registration pending".into()));
        }

        match (credentials.from_country_code, credentials.from_party_id) {
            (Some(country_code), Some(party_id)) => {
                if !credential.is_owned_by(country_code, party_id) {
                    warn!(
                        country_code,
                        party_id,
                        owner_country_code = credential.country_code.as_str(),
                        owner_party_id = credential.party_id.as_str(),
                        "Declared party does not own the credentials token"
                    );
                    return Err(BridgeError::Unauthorized(
                        "from-party does not match credentials owner".into(),
                    ));
                }
            }
            (None, None) if !require_party => {}
            _ => {
                return Err(BridgeError::Unauthorized(
                    "OCPI-from-country-code and OCPI-from-party-id are required".into(),
                ))
            }
        }

        debug!(
            country_code = credential.country_code.as_str(),
            party_id = credential.party_id.as_str(),
            "OCPI caller authenticated"
        );

        Ok(PartyContext {
            country_code: credential.country_code,
            party_id: credential.party_id,
            token: credential.token,
        })
    }

    /// Raw token first; OCPI 2.2.1 partners send it base64 encoded.
    async fn lookup(&self, token: &str) -> BridgeResult<Option<RoamingCredential>> {
        let registrations = self.stores.registrations();
        if let Some(found) = registrations.get_registration_details(token).await? {
            return Ok(Some(found));
        }
        let decoded = match STANDARD
            .decode(token)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(decoded) if decoded != token => decoded,
            _ => return Ok(None),
        };
        Ok(registrations.get_registration_details(&decoded).await?)
    }
}

fn extract_token(header: &str) -> Option<&str> {
    let (scheme, value) = header.trim().split_once(' ')?;
    let value = value.trim();
    (scheme.eq_ignore_ascii_case("Token") && !value.is_empty()).then_some(value)
}
