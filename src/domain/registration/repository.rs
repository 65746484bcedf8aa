use async_trait::async_trait;

use super::{OcpiParty, PartyRole, RoamingCredential};
use crate::shared::errors::StoreResult;

/// Registrations keyed by the credentials token the partner presents.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn set_registration_details(&self, credential: RoamingCredential) -> StoreResult<()>;
    async fn get_registration_details(&self, token: &str)
        -> StoreResult<Option<RoamingCredential>>;
}

#[async_trait]
pub trait PartyStore: Send + Sync {
    async fn set_party_details(&self, party: OcpiParty) -> StoreResult<()>;
    async fn get_party_details(
        &self,
        role: PartyRole,
        country_code: &str,
        party_id: &str,
    ) -> StoreResult<Option<OcpiParty>>;
}
