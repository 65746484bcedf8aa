//! Session registry: active charge station WebSocket connections

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::connection::Connection;
use crate::domain::OcppVersion;
use crate::shared::errors::EmitError;

/// Thread-safe registry of active OCPP sessions, one per station
pub struct SessionRegistry {
    sessions: DashMap<String, Connection>,
    next_connection_id: AtomicU64,
}

pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_connection_id: AtomicU64::new(1),
        }
    }

    pub fn shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    /// Register a connection, replacing any earlier one for the same
    /// station. Returns the new connection's id.
    pub fn register(
        &self,
        charge_station_id: &str,
        sender: mpsc::UnboundedSender<String>,
        ocpp_version: OcppVersion,
    ) -> u64 {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let connection = Connection::new(connection_id, charge_station_id, sender, ocpp_version);
        if let Some(previous) = self
            .sessions
            .insert(charge_station_id.to_string(), connection)
        {
            warn!(
                charge_station_id,
                evicted_connection_id = previous.connection_id,
                "Replacing existing session"
            );
        }
        info!(charge_station_id, connection_id, %ocpp_version, "Registered charge station session");
        connection_id
    }

    /// Remove the session if it still belongs to `connection_id`; a newer
    /// connection of the same station is left alone.
    pub fn unregister(&self, charge_station_id: &str, connection_id: u64) -> bool {
        let removed = self
            .sessions
            .remove_if(charge_station_id, |_, conn| conn.connection_id == connection_id)
            .is_some();
        if removed {
            info!(charge_station_id, connection_id, "Unregistered charge station session");
        }
        removed
    }

    pub fn send_to(&self, charge_station_id: &str, message: String) -> Result<(), EmitError> {
        match self.sessions.get(charge_station_id) {
            Some(conn) => conn.send(message),
            None => Err(EmitError::NotConnected(charge_station_id.to_string())),
        }
    }

    pub fn touch(&self, charge_station_id: &str) {
        if let Some(mut conn) = self.sessions.get_mut(charge_station_id) {
            conn.touch();
        }
    }

    pub fn is_connected(&self, charge_station_id: &str) -> bool {
        self.sessions.contains_key(charge_station_id)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn get_version(&self, charge_station_id: &str) -> Option<OcppVersion> {
        self.sessions
            .get(charge_station_id)
            .map(|conn| conn.ocpp_version)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_to_unknown_station_fails() {
        let registry = SessionRegistry::new();
        assert_eq!(
            registry.send_to("nope", "x".into()),
            Err(EmitError::NotConnected("nope".into()))
        );
    }

    #[test]
    fn reconnect_survives_stale_unregister() {
        let registry = SessionRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let first = registry.register("CS1", tx1, OcppVersion::V16);
        let second = registry.register("CS1", tx2, OcppVersion::V201);
        assert_ne!(first, second);

        assert!(!registry.unregister("CS1", first));
        assert!(registry.is_connected("CS1"));
        assert_eq!(registry.get_version("CS1"), Some(OcppVersion::V201));

        registry.send_to("CS1", "frame".into()).unwrap();
        assert_eq!(rx2.try_recv().unwrap(), "frame");

        assert!(registry.unregister("CS1", second));
        assert_eq!(registry.count(), 0);
    }
}
