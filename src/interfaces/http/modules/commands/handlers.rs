//! Command receiver handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use tracing::info;

use super::dto::{CommandResponseDto, StartSessionRequest, StopSessionRequest};
use crate::application::auth::PartyContext;
use crate::application::commands::{CommandDispatcher, CommandOrigin, CommandType};
use crate::interfaces::http::common::{parse_validated, OcpiIdentity, OcpiResponse};
use crate::interfaces::http::error::ApiResult;
use crate::interfaces::http::middleware::{header_str, TO_COUNTRY_CODE_HEADER, TO_PARTY_ID_HEADER};
use crate::interfaces::http::modules::request_id::CorrelationId;
use crate::shared::errors::BridgeError;

/// Command handler state
#[derive(Clone)]
pub struct CommandsState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub identity: OcpiIdentity,
}

fn origin(
    identity: &OcpiIdentity,
    requester: PartyContext,
    headers: &HeaderMap,
    correlation_id: String,
) -> CommandOrigin {
    CommandOrigin {
        requester,
        to_country_code: header_str(headers, TO_COUNTRY_CODE_HEADER)
            .unwrap_or(&identity.country_code)
            .to_string(),
        to_party_id: header_str(headers, TO_PARTY_ID_HEADER)
            .unwrap_or(&identity.party_id)
            .to_string(),
        correlation_id,
    }
}

fn parse<T>(body: &[u8]) -> Result<T, BridgeError>
where
    T: serde::de::DeserializeOwned + validator::Validate,
{
    parse_validated(body).map_err(|rejection| BridgeError::Validation(rejection.message()))
}

#[utoipa::path(
    post,
    path = "/ocpi/receiver/2.2/commands/{command}",
    tag = "Commands",
    security(("ocpi_token" = [])),
    params(
        ("command" = String, Path, description = "START_SESSION, STOP_SESSION, RESERVE_NOW, CANCEL_RESERVATION or UNLOCK_CONNECTOR")
    ),
    request_body(content = StartSessionRequest, description = "StartSession or StopSession object, depending on the command"),
    responses(
        (status = 200, description = "Command acknowledged; the result follows on response_url", body = OcpiResponse<CommandResponseDto>),
        (status = 400, description = "Unknown command, malformed body or EVSE id (OCPI 2001)"),
        (status = 401, description = "Unknown or unregistered credentials token")
    )
)]
pub async fn post_command(
    State(state): State<CommandsState>,
    Extension(party): Extension<PartyContext>,
    Extension(CorrelationId(correlation_id)): Extension<CorrelationId>,
    Path(command): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<OcpiResponse<CommandResponseDto>>> {
    let command: CommandType = command.parse().map_err(BridgeError::Validation)?;
    info!(
        command = %command,
        from = %format!("{}/{}", party.country_code, party.party_id),
        "OCPI command received"
    );

    let origin = origin(&state.identity, party, &headers, correlation_id);
    let response = match command {
        CommandType::StartSession => {
            let request: StartSessionRequest = parse(&body)?;
            state
                .dispatcher
                .start_session(request.into(), origin)
                .await?
        }
        CommandType::StopSession => {
            let request: StopSessionRequest = parse(&body)?;
            state
                .dispatcher
                .stop_session(request.into(), origin)
                .await?
        }
        CommandType::ReserveNow | CommandType::CancelReservation | CommandType::UnlockConnector => {
            state.dispatcher.not_supported(command)
        }
    };

    Ok(Json(OcpiResponse::success(response.into())))
}
