//! OCPI registrations and party credentials
//!
//! A registration binds an inbound credentials token to the party that owns
//! it. Party details hold what the bridge needs to call that party back.

pub mod model;
pub mod repository;

pub use model::{OcpiParty, PartyRole, RegistrationStatus, RoamingCredential};
pub use repository::{PartyStore, RegistrationStore};
