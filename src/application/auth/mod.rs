pub mod gateway;

pub use gateway::{AuthGateway, Credentials, PartyContext};
