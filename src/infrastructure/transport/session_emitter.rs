//! [`Emitter`] over the live WebSocket sessions

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::ports::{Emitter, OcppCall};
use crate::application::session::SharedSessionRegistry;
use crate::domain::OcppVersion;
use crate::shared::errors::EmitError;

pub struct SessionEmitter {
    sessions: SharedSessionRegistry,
}

impl SessionEmitter {
    pub fn new(sessions: SharedSessionRegistry) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl Emitter for SessionEmitter {
    async fn emit(
        &self,
        charge_station_id: &str,
        version: OcppVersion,
        call: &OcppCall,
    ) -> Result<(), EmitError> {
        match self.sessions.get_version(charge_station_id) {
            None => return Err(EmitError::NotConnected(charge_station_id.to_string())),
            Some(live) if live != version => {
                warn!(
                    charge_station_id,
                    recorded = %version,
                    live = %live,
                    "Recorded OCPP version differs from the live session"
                );
            }
            Some(_) => {}
        }

        let frame = call.frame().serialize();
        debug!(
            charge_station_id,
            message_id = call.message_id.as_str(),
            action = call.action,
            "Emitting Call"
        );
        self.sessions.send_to(charge_station_id, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::SessionRegistry;
    use crate::shared::ocpp_frame::OcppFrame;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn call() -> OcppCall {
        OcppCall {
            message_id: "m-1".into(),
            action: "RemoteStartTransaction",
            payload: json!({"idTag": "DEADBEEF"}),
        }
    }

    #[tokio::test]
    async fn emits_framed_call_to_session() {
        let sessions = SessionRegistry::shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        sessions.register("CS1", tx, OcppVersion::V16);
        let emitter = SessionEmitter::new(sessions);

        emitter.emit("CS1", OcppVersion::V16, &call()).await.unwrap();

        let sent = rx.try_recv().unwrap();
        assert_eq!(OcppFrame::parse(&sent).unwrap(), call().frame());
    }

    #[tokio::test]
    async fn disconnected_station_is_an_error() {
        let emitter = SessionEmitter::new(SessionRegistry::shared());
        assert_eq!(
            emitter.emit("CS1", OcppVersion::V16, &call()).await,
            Err(EmitError::NotConnected("CS1".into()))
        );
    }
}
