pub mod charge_station;
pub mod ocpp;
pub mod registration;
pub mod repositories;
pub mod token;
pub mod transaction;

pub use charge_station::{ChargeStationRuntimeStore, RuntimeDetails};
pub use ocpp::OcppVersion;
pub use registration::{
    OcpiParty, PartyRole, PartyStore, RegistrationStatus, RegistrationStore, RoamingCredential,
};
pub use repositories::StoreProvider;
pub use token::{CacheMode, Token, TokenPatch, TokenStore, TokenType};
pub use transaction::{
    MeterValue, SampledValue, Transaction, TransactionReport, TransactionStore, UnitOfMeasure,
};
