//! Commands awaiting a station response
//!
//! Each accepted command is recorded under (charge station id, message id)
//! before its Call is emitted. The record is removed by whichever comes
//! first: the station's CallResult/CallError, the deadline sweep, or the
//! station disconnecting. `DashMap::remove` is atomic, so exactly one of
//! them delivers the callback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::callback::{failed, result_from_payload, timed_out, AwaitingResult, ResultNotifier};
use crate::application::ports::CommandResult;
use crate::shared::shutdown::ShutdownSignal;

type PendingKey = (String, String);

#[derive(Debug, Clone)]
struct PendingCommand {
    awaiting: AwaitingResult,
    deadline: Instant,
}

pub struct PendingCommands {
    entries: DashMap<PendingKey, PendingCommand>,
    notifier: Arc<ResultNotifier>,
}

pub type SharedPendingCommands = Arc<PendingCommands>;

impl PendingCommands {
    pub fn new(notifier: Arc<ResultNotifier>) -> Self {
        Self {
            entries: DashMap::new(),
            notifier,
        }
    }

    pub fn register(
        &self,
        charge_station_id: &str,
        message_id: &str,
        awaiting: AwaitingResult,
        timeout: Duration,
    ) {
        debug!(charge_station_id, message_id, command = %awaiting.command, "Awaiting station response");
        self.entries.insert(
            key(charge_station_id, message_id),
            PendingCommand {
                awaiting,
                deadline: Instant::now() + timeout,
            },
        );
    }

    /// Drop a record without a callback, used when the Call never left.
    pub fn cancel(&self, charge_station_id: &str, message_id: &str) -> bool {
        self.entries
            .remove(&key(charge_station_id, message_id))
            .is_some()
    }

    /// Returns `false` when the message id is not (or no longer) pending.
    pub fn resolve_result(&self, charge_station_id: &str, message_id: &str, payload: &Value) -> bool {
        self.resolve(charge_station_id, message_id, result_from_payload(payload))
    }

    pub fn resolve_error(
        &self,
        charge_station_id: &str,
        message_id: &str,
        error_code: &str,
        error_description: &str,
    ) -> bool {
        self.resolve(
            charge_station_id,
            message_id,
            failed(format!("{error_code}: {error_description}")),
        )
    }

    fn resolve(&self, charge_station_id: &str, message_id: &str, result: CommandResult) -> bool {
        match self.entries.remove(&key(charge_station_id, message_id)) {
            Some((_, pending)) => {
                info!(
                    charge_station_id,
                    message_id,
                    command = %pending.awaiting.command,
                    result = result.result.as_str(),
                    "Station answered command"
                );
                self.notifier.notify(pending.awaiting, result);
                true
            }
            None => {
                warn!(charge_station_id, message_id, "Response for unknown or expired request");
                false
            }
        }
    }

    /// Fail everything still waiting on a station that went away.
    pub fn fail_charge_station(&self, charge_station_id: &str) -> usize {
        let keys: Vec<PendingKey> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == charge_station_id)
            .map(|e| e.key().clone())
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k))
            .map(|(_, pending)| {
                self.notifier
                    .notify(pending.awaiting, failed("charge station disconnected"))
            })
            .count()
    }

    /// Time out every record whose deadline has passed.
    pub fn expire_overdue(&self, now: Instant) -> usize {
        let overdue: Vec<PendingKey> = self
            .entries
            .iter()
            .filter(|e| e.value().deadline <= now)
            .map(|e| e.key().clone())
            .collect();
        overdue
            .into_iter()
            .filter_map(|k| self.entries.remove_if(&k, |_, p| p.deadline <= now))
            .map(|((charge_station_id, message_id), pending)| {
                warn!(
                    charge_station_id = charge_station_id.as_str(),
                    message_id = message_id.as_str(),
                    command = %pending.awaiting.command,
                    "Command timed out"
                );
                self.notifier.notify(pending.awaiting, timed_out())
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Periodically expire overdue records until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, every: Duration, shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.expire_overdue(Instant::now());
                }
                _ = shutdown.notified().wait() => {
                    info!(pending = self.len(), "Pending command sweeper stopped");
                    return;
                }
            }
        }
    }
}

fn key(charge_station_id: &str, message_id: &str) -> PendingKey {
    (charge_station_id.to_string(), message_id.to_string())
}
