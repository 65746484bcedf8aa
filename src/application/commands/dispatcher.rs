//! Command dispatcher: resolves the target station and its OCPP version,
//! builds the Call with the registered [`CallMaker`] and emits it.
//!
//! The acknowledgement it returns says only whether the Call was handed to
//! the station's channel. The station's own answer arrives later through
//! [`PendingCommands`] and is posted to the command's `response_url`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::call_maker::{CallMakers, RemoteStart};
use super::callback::AwaitingResult;
use super::model::{CommandOrigin, CommandResponse, CommandResponseType, CommandType, StartSession, StopSession};
use super::pending::SharedPendingCommands;
use crate::application::evse::EvseResolver;
use crate::application::ports::{Emitter, OcppCall};
use crate::domain::{OcppVersion, StoreProvider};
use crate::shared::errors::{BridgeError, BridgeResult};

/// Timeouts applied by the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchTimeouts {
    /// Bound on version lookup and on Emit.
    pub acceptance: Duration,
    /// How long the station has to answer before the result is TIMEOUT.
    pub result: Duration,
}

impl Default for DispatchTimeouts {
    fn default() -> Self {
        Self {
            acceptance: Duration::from_secs(5),
            result: Duration::from_secs(30),
        }
    }
}

fn record_command(command: CommandType, result: CommandResponseType) {
    metrics::counter!(
        "ocpi_commands_total",
        "command" => command.as_str(),
        "result" => result.as_str()
    )
    .increment(1);
}

fn record_dispatch_latency(version: OcppVersion, start: Instant) {
    metrics::histogram!(
        "ocpp_command_dispatch_seconds",
        "version" => version.version_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub struct CommandDispatcher {
    stores: Arc<dyn StoreProvider>,
    resolver: EvseResolver,
    call_makers: CallMakers,
    emitter: Arc<dyn Emitter>,
    pending: SharedPendingCommands,
    timeouts: DispatchTimeouts,
}

impl CommandDispatcher {
    pub fn new(
        stores: Arc<dyn StoreProvider>,
        resolver: EvseResolver,
        call_makers: CallMakers,
        emitter: Arc<dyn Emitter>,
        pending: SharedPendingCommands,
        timeouts: DispatchTimeouts,
    ) -> Self {
        Self {
            stores,
            resolver,
            call_makers,
            emitter,
            pending,
            timeouts,
        }
    }

    fn result_timeout_secs(&self) -> u64 {
        self.timeouts.result.as_secs()
    }

    /// Commands this bridge does not translate.
    pub fn not_supported(&self, command: CommandType) -> CommandResponse {
        record_command(command, CommandResponseType::NotSupported);
        CommandResponse::new(CommandResponseType::NotSupported, self.result_timeout_secs())
            .with_message(format!("{command} is not supported"))
    }

    pub async fn start_session(
        &self,
        command: StartSession,
        origin: CommandOrigin,
    ) -> BridgeResult<CommandResponse> {
        let outcome = self.try_start_session(command, origin).await;
        self.acknowledge(CommandType::StartSession, outcome)
    }

    pub async fn stop_session(
        &self,
        command: StopSession,
        origin: CommandOrigin,
    ) -> BridgeResult<CommandResponse> {
        let outcome = self.try_stop_session(command, origin).await;
        self.acknowledge(CommandType::StopSession, outcome)
    }

    /// Negative outcomes become a REJECTED or UNKNOWN_SESSION response;
    /// malformed input and store failures propagate to the caller.
    fn acknowledge(
        &self,
        command: CommandType,
        outcome: BridgeResult<()>,
    ) -> BridgeResult<CommandResponse> {
        let timeout = self.result_timeout_secs();
        let response = match outcome {
            Ok(()) => CommandResponse::new(CommandResponseType::Accepted, timeout),
            Err(e) if e.is_rejection() => {
                warn!(command = %command, error = %e, "Command rejected");
                CommandResponse::new(CommandResponseType::Rejected, timeout).with_message(e.to_string())
            }
            Err(BridgeError::UnknownSession(session_id)) => {
                warn!(command = %command, session_id = session_id.as_str(), "Unknown session");
                CommandResponse::new(CommandResponseType::UnknownSession, timeout)
                    .with_message(format!("session {session_id} is not known"))
            }
            Err(e) => return Err(e),
        };
        record_command(command, response.result);
        Ok(response)
    }

    async fn try_start_session(&self, command: StartSession, origin: CommandOrigin) -> BridgeResult<()> {
        let evse_uid = command
            .evse_uid
            .as_deref()
            .ok_or_else(|| BridgeError::Validation("evse_uid is required".into()))?;
        let evse = self.resolver.resolve(evse_uid)?;
        let connector_id = match command.connector_id.as_deref() {
            Some(connector_id) => Some(connector_id.parse::<u32>().map_err(|_| {
                BridgeError::InvalidCall(format!("connector_id {connector_id} is not numeric"))
            })?),
            None => evse.connector_suffix.as_deref().and_then(|s| s.parse().ok()),
        };

        let version = self.resolve_version(&evse.charge_station_id).await?;
        let maker = self.call_maker(version)?;
        let call = maker.remote_start(&RemoteStart {
            id_token: command.token.uid.clone(),
            token_type: command.token.token_type,
            connector_id,
        })?;

        info!(
            charge_station_id = evse.charge_station_id.as_str(),
            %version,
            location_id = command.location_id.as_str(),
            authorization_reference = ?command.authorization_reference,
            "Dispatching remote start"
        );
        self.emit(
            &evse.charge_station_id,
            version,
            call,
            AwaitingResult {
                command: CommandType::StartSession,
                response_url: command.response_url,
                origin,
            },
        )
        .await
    }

    async fn try_stop_session(&self, command: StopSession, origin: CommandOrigin) -> BridgeResult<()> {
        let transaction = self
            .stores
            .transactions()
            .find_transaction(&command.session_id)
            .await?
            .ok_or_else(|| BridgeError::UnknownSession(command.session_id.clone()))?;
        let charge_station_id = transaction.charge_station_id;

        let version = self.resolve_version(&charge_station_id).await?;
        let call = self.call_maker(version)?.remote_stop(&transaction.transaction_id)?;

        info!(
            charge_station_id = charge_station_id.as_str(),
            %version,
            session_id = command.session_id.as_str(),
            "Dispatching remote stop"
        );
        self.emit(
            &charge_station_id,
            version,
            call,
            AwaitingResult {
                command: CommandType::StopSession,
                response_url: command.response_url,
                origin,
            },
        )
        .await
    }

    async fn resolve_version(&self, charge_station_id: &str) -> BridgeResult<OcppVersion> {
        let lookup = self.stores.runtime().lookup_runtime_details(charge_station_id);
        match tokio::time::timeout(self.timeouts.acceptance, lookup).await {
            Ok(Ok(Some(details))) => Ok(details.ocpp_version),
            Ok(Ok(None)) => Err(BridgeError::UnknownChargeStation(charge_station_id.to_string())),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(BridgeError::DispatchFailure(format!(
                "version lookup for {charge_station_id} timed out"
            ))),
        }
    }

    fn call_maker(&self, version: OcppVersion) -> BridgeResult<&Arc<dyn super::CallMaker>> {
        self.call_makers
            .get(version)
            .ok_or_else(|| BridgeError::DispatchFailure(format!("no call maker for {version}")))
    }

    /// Register the correlation record, then emit; the record is dropped
    /// again if the Call could not be handed over.
    async fn emit(
        &self,
        charge_station_id: &str,
        version: OcppVersion,
        call: OcppCall,
        awaiting: AwaitingResult,
    ) -> BridgeResult<()> {
        let start = Instant::now();
        self.pending
            .register(charge_station_id, &call.message_id, awaiting, self.timeouts.result);

        let emitted = tokio::time::timeout(
            self.timeouts.acceptance,
            self.emitter.emit(charge_station_id, version, &call),
        )
        .await;
        record_dispatch_latency(version, start);

        let failure = match emitted {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => BridgeError::from(e),
            Err(_) => BridgeError::DispatchFailure(format!("emit to {charge_station_id} timed out")),
        };
        self.pending.cancel(charge_station_id, &call.message_id);
        Err(failure)
    }
}
