use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OCPI version this platform implements
pub const OCPI_VERSION: &str = "2.2";

/// Entry of the versions list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionDto {
    pub version: String,
    pub url: String,
}

/// A module offered under a version
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndpointDto {
    pub identifier: String,
    /// `SENDER` or `RECEIVER`
    pub role: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionDetailsDto {
    pub version: String,
    pub endpoints: Vec<EndpointDto>,
}
