//! Version discovery handlers

use axum::{extract::State, Json};

use super::dto::{EndpointDto, VersionDetailsDto, VersionDto, OCPI_VERSION};
use crate::interfaces::http::common::{OcpiIdentity, OcpiResponse};

/// Version discovery state
#[derive(Clone)]
pub struct VersionsState {
    pub identity: OcpiIdentity,
}

/// Receiver modules this platform serves.
const RECEIVER_MODULES: [&str; 2] = ["commands", "tokens"];

#[utoipa::path(
    get,
    path = "/ocpi/versions",
    tag = "Versions",
    security(("ocpi_token" = [])),
    responses(
        (status = 200, description = "Supported OCPI versions", body = OcpiResponse<Vec<VersionDto>>),
        (status = 401, description = "Unknown or unregistered credentials token")
    )
)]
pub async fn list_versions(
    State(state): State<VersionsState>,
) -> Json<OcpiResponse<Vec<VersionDto>>> {
    Json(OcpiResponse::success(vec![VersionDto {
        version: OCPI_VERSION.to_string(),
        url: state.identity.endpoint(&format!("/ocpi/{OCPI_VERSION}")),
    }]))
}

#[utoipa::path(
    get,
    path = "/ocpi/2.2",
    tag = "Versions",
    security(("ocpi_token" = [])),
    responses(
        (status = 200, description = "Modules offered under OCPI 2.2", body = OcpiResponse<VersionDetailsDto>),
        (status = 401, description = "Unknown or unregistered credentials token")
    )
)]
pub async fn version_details(
    State(state): State<VersionsState>,
) -> Json<OcpiResponse<VersionDetailsDto>> {
    let endpoints = RECEIVER_MODULES
        .iter()
        .map(|module| EndpointDto {
            identifier: module.to_string(),
            role: "RECEIVER".to_string(),
            url: state
                .identity
                .endpoint(&format!("/ocpi/receiver/{OCPI_VERSION}/{module}")),
        })
        .collect();

    Json(OcpiResponse::success(VersionDetailsDto {
        version: OCPI_VERSION.to_string(),
        endpoints,
    }))
}
