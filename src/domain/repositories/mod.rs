//! Store access for the application layer
//!
//! `StoreProvider` hands out each collaborator store so consumers ask only
//! for the one they need:
//!
//! ```ignore
//! async fn authorize(stores: &dyn StoreProvider, uid: &str) {
//!     let token = stores.tokens().lookup_token(uid).await?;
//! }
//! ```

use super::charge_station::ChargeStationRuntimeStore;
use super::registration::{PartyStore, RegistrationStore};
use super::token::TokenStore;
use super::transaction::TransactionStore;

pub trait StoreProvider: Send + Sync {
    fn tokens(&self) -> &dyn TokenStore;
    fn runtime(&self) -> &dyn ChargeStationRuntimeStore;
    fn transactions(&self) -> &dyn TransactionStore;
    fn registrations(&self) -> &dyn RegistrationStore;
    fn parties(&self) -> &dyn PartyStore;
}
