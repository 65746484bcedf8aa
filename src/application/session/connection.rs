//! WebSocket connection abstraction

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::domain::OcppVersion;
use crate::shared::errors::EmitError;

/// An active WebSocket connection to a charge station
#[derive(Debug)]
pub struct Connection {
    /// Distinguishes successive connections of the same station
    pub connection_id: u64,
    pub charge_station_id: String,
    /// Outbound frames, drained by the connection's write loop
    pub sender: mpsc::UnboundedSender<String>,
    pub ocpp_version: OcppVersion,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    pub fn new(
        connection_id: u64,
        charge_station_id: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
        ocpp_version: OcppVersion,
    ) -> Self {
        let now = Utc::now();
        Self {
            connection_id,
            charge_station_id: charge_station_id.into(),
            sender,
            ocpp_version,
            connected_at: now,
            last_activity: now,
        }
    }

    /// Queue a frame for the station. Never blocks.
    pub fn send(&self, message: String) -> Result<(), EmitError> {
        self.sender
            .send(message)
            .map_err(|_| EmitError::ChannelClosed(self.charge_station_id.clone()))
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new(1, "CS001", tx, OcppVersion::V16);
        (conn, rx)
    }

    #[test]
    fn send_delivers_message() {
        let (conn, mut rx) = make_connection();
        conn.send("hello".into()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn send_to_closed_channel_returns_error() {
        let (conn, rx) = make_connection();
        drop(rx);
        assert_eq!(
            conn.send("msg".into()),
            Err(EmitError::ChannelClosed("CS001".into()))
        );
    }

    #[test]
    fn touch_updates_last_activity() {
        let (mut conn, _rx) = make_connection();
        let before = conn.last_activity;
        std::thread::sleep(std::time::Duration::from_millis(10));
        conn.touch();
        assert!(conn.last_activity >= before);
    }
}
