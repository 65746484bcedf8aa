//! OCPP WebSocket server
//!
//! Accepts charge station connections at `ws://<host>:<port>/ocpp/{charge_station_id}`.
//! The negotiated version is recorded in the runtime store so commands can
//! be built for it; the session is registered so they can be delivered.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::negotiator::ProtocolNegotiator;
use crate::application::handlers::{OcppHandlerV16, OcppHandlerV201, SharedInboundServices};
use crate::application::session::SharedSessionRegistry;
use crate::domain::{OcppVersion, RuntimeDetails, StoreProvider};
use crate::shared::shutdown::ShutdownSignal;

const SUBPROTOCOL_HEADER: &str = "sec-websocket-protocol";

type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Per-connection handler for the negotiated version.
enum StationHandler {
    V16(OcppHandlerV16),
    V201(OcppHandlerV201),
}

impl StationHandler {
    fn new(version: OcppVersion, charge_station_id: &str, services: SharedInboundServices) -> Self {
        match version {
            OcppVersion::V16 => Self::V16(OcppHandlerV16::new(charge_station_id, services)),
            OcppVersion::V201 => Self::V201(OcppHandlerV201::new(charge_station_id, services)),
        }
    }

    async fn handle(&self, text: &str) -> Option<String> {
        match self {
            Self::V16(h) => h.handle(text).await,
            Self::V201(h) => h.handle(text).await,
        }
    }
}

/// Everything a connection task needs.
#[derive(Clone)]
struct ConnectionContext {
    sessions: SharedSessionRegistry,
    stores: Arc<dyn StoreProvider>,
    services: SharedInboundServices,
    negotiator: Arc<ProtocolNegotiator>,
    shutdown: Option<ShutdownSignal>,
}

pub struct OcppServer {
    address: String,
    context: ConnectionContext,
}

impl OcppServer {
    pub fn new(
        address: impl Into<String>,
        sessions: SharedSessionRegistry,
        stores: Arc<dyn StoreProvider>,
        services: SharedInboundServices,
    ) -> Self {
        Self {
            address: address.into(),
            context: ConnectionContext {
                sessions,
                stores,
                services,
                negotiator: Arc::new(ProtocolNegotiator::default()),
                shutdown: None,
            },
        }
    }

    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.context.shutdown = Some(signal);
        self
    }

    pub async fn run(&self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.address).await?;
        info!(
            "🔌 OCPP server listening on ws://{} ({})",
            self.address,
            self.context.negotiator.supported_subprotocols().join(", ")
        );
        info!(
            "   Charge stations should connect to: ws://{}/ocpp/{{charge_station_id}}",
            self.address
        );
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> ServerResult<()> {
        let Some(shutdown) = self.context.shutdown.clone() else {
            while let Ok((stream, addr)) = listener.accept().await {
                self.spawn_connection(stream, addr);
            }
            return Ok(());
        };

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.spawn_connection(stream, addr),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!(
                        connected = self.context.sessions.count(),
                        "🛑 WebSocket server received shutdown signal"
                    );
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let context = self.context.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, context).await {
                warn!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Station id from `/ocpp/{id}`, or a bare `/{id}`.
fn extract_charge_station_id(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');

    if let Some(id) = path.strip_prefix("ocpp/") {
        let id = id.trim_start_matches('/');
        if !id.is_empty() && !id.contains('/') {
            return Some(id.to_string());
        }
        return None;
    }

    if !path.is_empty() && !path.contains('/') {
        return Some(path.to_string());
    }

    None
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, context: ConnectionContext) -> ServerResult<()> {
    debug!("New connection from: {}", addr);

    let mut accepted: Option<(String, OcppVersion)> = None;
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, mut response: Response| {
        let path = req.uri().path();
        let Some(charge_station_id) = extract_charge_station_id(path) else {
            warn!(%addr, path, "Rejecting connection without charge station id");
            return Err(reject(StatusCode::NOT_FOUND, "expected /ocpp/{charge_station_id}"));
        };

        let requested = req
            .headers()
            .get(SUBPROTOCOL_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let version = if requested.trim().is_empty() {
            // stations that predate subprotocol negotiation speak 1.6
            OcppVersion::V16
        } else {
            match context.negotiator.negotiate(requested) {
                Some(version) => {
                    response.headers_mut().insert(
                        SUBPROTOCOL_HEADER,
                        HeaderValue::from_static(version.subprotocol()),
                    );
                    version
                }
                None => {
                    warn!(
                        charge_station_id = charge_station_id.as_str(),
                        requested,
                        "No mutually supported OCPP version"
                    );
                    return Err(reject(StatusCode::BAD_REQUEST, "unsupported OCPP subprotocol"));
                }
            }
        };

        accepted = Some((charge_station_id, version));
        Ok(response)
    })
    .await?;

    let Some((charge_station_id, version)) = accepted else {
        return Ok(());
    };
    let cs_id = charge_station_id.as_str();
    info!(charge_station_id = cs_id, %addr, %version, "Charge station connected");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    // Calls from the bridge arrive through the registry; replies to the
    // station's own Calls stay on this connection.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();

    let connection_id = context.sessions.register(cs_id, tx, version);
    if let Err(e) = context
        .stores
        .runtime()
        .set_runtime_details(cs_id, RuntimeDetails::new(version))
        .await
    {
        error!(charge_station_id = cs_id, error = %e, "Failed to record runtime details");
    }

    let handler = StationHandler::new(version, cs_id, context.services.clone());

    let send_id = charge_station_id.clone();
    let send_task = async move {
        loop {
            let msg = tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => {
                        // dropped by the registry: a newer connection took over
                        debug!(charge_station_id = send_id.as_str(), "Session replaced");
                        break;
                    }
                },
                Some(reply) = reply_rx.recv() => reply,
            };
            debug!(charge_station_id = send_id.as_str(), "-> {}", msg);
            if let Err(e) = ws_sender.send(Message::Text(msg)).await {
                warn!(charge_station_id = send_id.as_str(), error = %e, "Send error");
                break;
            }
        }
    };

    let sessions = context.sessions.clone();
    let recv_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    sessions.touch(cs_id);
                    if let Some(response) = handler.handle(&text).await {
                        if reply_tx.send(response).is_err() {
                            warn!(charge_station_id = cs_id, "Failed to queue response");
                            break;
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!(charge_station_id = cs_id, "Close frame received: {:?}", frame);
                    break;
                }
                Ok(Message::Binary(data)) => {
                    warn!(charge_station_id = cs_id, bytes = data.len(), "Ignoring binary message");
                }
                Ok(_) => sessions.touch(cs_id),
                Err(e) => {
                    warn!(charge_station_id = cs_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    };

    match context.shutdown.clone() {
        Some(shutdown) => {
            tokio::select! {
                _ = send_task => {},
                _ = recv_task => {},
                _ = shutdown.notified().wait() => {
                    info!(charge_station_id = cs_id, "Connection closing due to server shutdown");
                }
            }
        }
        None => {
            tokio::select! {
                _ = send_task => {},
                _ = recv_task => {},
            }
        }
    }

    if context.sessions.unregister(cs_id, connection_id) {
        let failed = context.services.pending.fail_charge_station(cs_id);
        if failed > 0 {
            warn!(charge_station_id = cs_id, failed, "Station disconnected with commands in flight");
        }
    }
    info!(charge_station_id = cs_id, "Charge station disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::commands::callback::tests::RecordingCallbackSender;
    use crate::application::commands::{PendingCommands, ResultNotifier};
    use crate::application::handlers::InboundServices;
    use crate::application::session::SessionRegistry;
    use crate::application::transactions::{TransactionAuthorizer, TransactionRecorder};
    use crate::domain::ChargeStationRuntimeStore;
    use crate::infrastructure::storage::InMemoryStore;
    use crate::shared::ocpp_frame::OcppFrame;
    use crate::shared::retry::RetryConfig;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    #[test]
    fn extracts_station_id_from_path() {
        assert_eq!(extract_charge_station_id("/ocpp/CS001"), Some("CS001".into()));
        assert_eq!(extract_charge_station_id("/CS001"), Some("CS001".into()));
        assert_eq!(extract_charge_station_id("/ocpp/"), None);
        assert_eq!(extract_charge_station_id("/ocpp/a/b"), None);
        assert_eq!(extract_charge_station_id("/"), None);
    }

    async fn start() -> (SocketAddr, SharedSessionRegistry, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let sessions = SessionRegistry::shared();
        let notifier = Arc::new(ResultNotifier::new(
            Arc::new(RecordingCallbackSender::default()),
            store.clone(),
            RetryConfig::with_attempts(1),
        ));
        let services = Arc::new(InboundServices {
            authorizer: TransactionAuthorizer::new(store.clone()),
            recorder: TransactionRecorder::new(store.clone()),
            pending: Arc::new(PendingCommands::new(notifier)),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = OcppServer::new(addr.to_string(), sessions.clone(), store.clone(), services);
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (addr, sessions, store)
    }

    #[tokio::test]
    async fn negotiates_version_and_answers_heartbeat() {
        let (addr, sessions, store) = start().await;
        let mut request = format!("ws://{addr}/ocpp/CS201").into_client_request().unwrap();
        request
            .headers_mut()
            .insert(SUBPROTOCOL_HEADER, HeaderValue::from_static("ocpp1.6, ocpp2.0.1"));

        let (mut ws, response) = tokio_tungstenite::connect_async(request).await.unwrap();
        assert_eq!(response.headers()[SUBPROTOCOL_HEADER], "ocpp2.0.1");

        ws.send(Message::Text(r#"[2,"h1","Heartbeat",{}]"#.to_string()))
            .await
            .unwrap();
        let reply = loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => break text,
                _ => continue,
            }
        };
        assert!(matches!(OcppFrame::parse(&reply).unwrap(), OcppFrame::CallResult { .. }));

        let details = store.lookup_runtime_details("CS201").await.unwrap().unwrap();
        assert_eq!(details.ocpp_version, OcppVersion::V201);
        assert!(sessions.is_connected("CS201"));

        ws.close(None).await.unwrap();
        for _ in 0..50 {
            if !sessions.is_connected("CS201") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!sessions.is_connected("CS201"));
    }

    #[tokio::test]
    async fn rejects_unsupported_subprotocol() {
        let (addr, sessions, _) = start().await;
        let mut request = format!("ws://{addr}/ocpp/CS21").into_client_request().unwrap();
        request
            .headers_mut()
            .insert(SUBPROTOCOL_HEADER, HeaderValue::from_static("ocpp2.1"));

        assert!(tokio_tungstenite::connect_async(request).await.is_err());
        assert!(!sessions.is_connected("CS21"));
    }

    async fn next_text(
        ws: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> Option<String> {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
        None
    }

    #[tokio::test]
    async fn replaced_connection_is_closed_and_replies_stay_on_their_socket() {
        let (addr, sessions, _) = start().await;
        let url = format!("ws://{addr}/ocpp/CS16");
        let (mut first, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        for _ in 0..50 {
            if sessions.is_connected("CS16") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let (mut second, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(2), next_text(&mut first))
            .await
            .unwrap();
        assert_eq!(closed, None);

        second
            .send(Message::Text(r#"[2,"b1","Heartbeat",{}]"#.to_string()))
            .await
            .unwrap();
        let reply = tokio::time::timeout(Duration::from_secs(2), next_text(&mut second))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(OcppFrame::parse(&reply).unwrap().unique_id(), "b1");
    }
}
