//! OCPI router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::OcpiIdentity;
use super::middleware::{ocpi_discovery_auth, ocpi_module_auth};
use super::modules::{commands, health, metrics, request_id, tokens, versions};
use crate::application::auth::AuthGateway;
use crate::application::commands::{CommandDispatcher, SharedPendingCommands};
use crate::application::session::SharedSessionRegistry;
use crate::domain::StoreProvider;

/// Everything the OCPI routes need. Axum extracts each handler's own
/// state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub stores: Arc<dyn StoreProvider>,
    pub gateway: Arc<AuthGateway>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub sessions: SharedSessionRegistry,
    pub pending: SharedPendingCommands,
    pub identity: OcpiIdentity,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for versions::VersionsState {
    fn from_ref(s: &ApiState) -> Self {
        versions::VersionsState {
            identity: s.identity.clone(),
        }
    }
}

impl FromRef<ApiState> for tokens::TokensState {
    fn from_ref(s: &ApiState) -> Self {
        tokens::TokensState {
            stores: Arc::clone(&s.stores),
        }
    }
}

impl FromRef<ApiState> for commands::CommandsState {
    fn from_ref(s: &ApiState) -> Self {
        commands::CommandsState {
            dispatcher: Arc::clone(&s.dispatcher),
            identity: s.identity.clone(),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            sessions: s.sessions.clone(),
            pending: s.pending.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for metrics::MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        metrics::MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "ocpi_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "`Token <credentials token>`, raw or base64 encoded",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        versions::list_versions,
        versions::version_details,
        tokens::get_token,
        tokens::put_token,
        tokens::patch_token,
        commands::post_command,
    ),
    components(
        schemas(
            health::HealthResponse,
            versions::VersionDto,
            versions::EndpointDto,
            versions::VersionDetailsDto,
            tokens::TokenDto,
            tokens::TokenPatchDto,
            commands::StartSessionRequest,
            commands::StopSessionRequest,
            commands::CommandResponseDto,
            commands::DisplayTextDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Versions", description = "OCPI version discovery"),
        (name = "Tokens", description = "Tokens module, receiver interface"),
        (name = "Commands", description = "Commands module, receiver interface; results are posted to response_url"),
    ),
    info(
        title = "Texnouz OCPI Bridge",
        version = "0.1.0",
        description = "OCPI 2.2 receiver bridging roaming commands to OCPP 1.6 / 2.0.1 charge stations",
        license(name = "MIT"),
        contact(name = "Texnouz", email = "support@texnouz.com")
    )
)]
pub struct ApiDoc;

pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Version discovery: token only
    let discovery_routes = Router::new()
        .route("/ocpi/versions", get(versions::list_versions))
        .route("/ocpi/2.2", get(versions::version_details))
        .route_layer(middleware::from_fn_with_state(
            state.gateway.clone(),
            ocpi_discovery_auth,
        ));

    // Modules: token and from-party headers
    let module_routes = Router::new()
        .route(
            "/ocpi/receiver/2.2/tokens/{country_code}/{party_id}/{uid}",
            get(tokens::get_token)
                .put(tokens::put_token)
                .patch(tokens::patch_token),
        )
        .route(
            "/ocpi/receiver/2.2/commands/{command}",
            post(commands::post_command),
        )
        .route_layer(middleware::from_fn_with_state(
            state.gateway.clone(),
            ocpi_module_auth,
        ));

    let swagger_routes = SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .merge(discovery_routes)
        .merge(module_routes)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::callback::tests::RecordingCallbackSender;
    use crate::application::commands::{
        CallMakers, DispatchTimeouts, PendingCommands, ResultNotifier,
    };
    use crate::application::evse::{EvseResolver, DEFAULT_EVSE_ID_PATTERN};
    use crate::application::session::SessionRegistry;
    use crate::domain::{
        ChargeStationRuntimeStore, OcppVersion, RegistrationStatus, RegistrationStore,
        RoamingCredential, RuntimeDetails, TokenStore,
    };
    use crate::infrastructure::storage::InMemoryStore;
    use crate::infrastructure::transport::SessionEmitter;
    use crate::shared::ocpp_frame::OcppFrame;
    use crate::shared::retry::RetryConfig;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    const TOKEN_PATH: &str = "/ocpi/receiver/2.2/tokens/NL/EXA/012345678";

    struct Harness {
        app: Router,
        store: Arc<InMemoryStore>,
        sessions: SharedSessionRegistry,
        pending: SharedPendingCommands,
    }

    async fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_registration_details(RoamingCredential {
                token: "emsp-token".into(),
                status: RegistrationStatus::Registered,
                country_code: "NL".into(),
                party_id: "EXA".into(),
            })
            .await
            .unwrap();

        let sessions = SessionRegistry::shared();
        let notifier = Arc::new(ResultNotifier::new(
            Arc::new(RecordingCallbackSender::default()),
            store.clone(),
            RetryConfig::with_attempts(1),
        ));
        let pending = Arc::new(PendingCommands::new(notifier));
        let dispatcher = Arc::new(CommandDispatcher::new(
            store.clone(),
            EvseResolver::new(DEFAULT_EVSE_ID_PATTERN).unwrap(),
            CallMakers::supported(),
            Arc::new(SessionEmitter::new(sessions.clone())),
            pending.clone(),
            DispatchTimeouts::default(),
        ));

        let state = ApiState {
            stores: store.clone(),
            gateway: Arc::new(AuthGateway::new(store.clone())),
            dispatcher,
            sessions: sessions.clone(),
            pending: pending.clone(),
            identity: OcpiIdentity {
                country_code: "UZ".into(),
                party_id: "TXN".into(),
                base_url: "https://cpo.example.com".into(),
            },
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            started_at: Arc::new(Instant::now()),
        };

        Harness {
            app: create_api_router(state),
            store,
            sessions,
            pending,
        }
    }

    fn ocpi_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Token emsp-token")
            .header("OCPI-from-country-code", "NL")
            .header("OCPI-from-party-id", "EXA")
            .header("X-Correlation-ID", "corr-42");
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn token_json(uid: &str) -> Value {
        json!({
            "country_code": "NL",
            "party_id": "EXA",
            "uid": uid,
            "type": "RFID",
            "contract_id": "NL-EXA-C12345678-X",
            "issuer": "Example eMSP",
            "valid": true,
            "whitelist": "ALLOWED"
        })
    }

    fn start_session_body(evse_uid: &str) -> Value {
        json!({
            "response_url": "https://emsp.example.com/ocpi/2.2/commands/START_SESSION/1",
            "token": token_json("012345678"),
            "location_id": "LOC1",
            "evse_uid": evse_uid,
            "connector_id": "1"
        })
    }

    #[tokio::test]
    async fn versions_point_at_base_url() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/ocpi/versions")
                    .header("Authorization", "Token emsp-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status_code"], 1000);
        assert_eq!(body["data"][0]["version"], "2.2");
        assert_eq!(body["data"][0]["url"], "https://cpo.example.com/ocpi/2.2");

        let resp = h
            .app
            .oneshot(ocpi_request(Method::GET, "/ocpi/2.2", None))
            .await
            .unwrap();
        let body = json_body(resp).await;
        let endpoints = body["data"]["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints.iter().any(|e| e["identifier"] == "tokens"
            && e["url"] == "https://cpo.example.com/ocpi/receiver/2.2/tokens"));
    }

    #[tokio::test]
    async fn missing_credentials_are_401() {
        let h = harness().await;
        let resp = h
            .app
            .oneshot(
                Request::builder()
                    .uri(TOKEN_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(request_id::REQUEST_ID_HEADER));
        assert_eq!(json_body(resp).await["status_code"], 2000);
    }

    #[tokio::test]
    async fn put_then_get_token() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::PUT,
                TOKEN_PATH,
                Some(token_json("012345678")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status_code"], 1000);

        let resp = h
            .app
            .oneshot(ocpi_request(Method::GET, TOKEN_PATH, None))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["data"]["uid"], "012345678");
        assert_eq!(body["data"]["whitelist"], "ALLOWED");
        assert!(body["data"]["last_updated"].is_string());
    }

    #[tokio::test]
    async fn put_token_path_mismatch_is_2001() {
        let h = harness().await;
        let resp = h
            .app
            .oneshot(ocpi_request(
                Method::PUT,
                TOKEN_PATH,
                Some(token_json("OTHER-UID")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["status_code"], 2001);
        assert!(h.store.lookup_token("OTHER-UID").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_updates_known_token_only() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::PATCH,
                TOKEN_PATH,
                Some(json!({"valid": false})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["status_code"], 2004);

        h.store
            .set_token(serde_json::from_value(json!({
                "country_code": "NL", "party_id": "EXA", "uid": "012345678",
                "type": "RFID", "contract_id": "C1", "issuer": "I",
                "valid": true, "whitelist": "ALWAYS",
                "last_updated": "2024-01-01T00:00:00Z"
            })).unwrap())
            .await
            .unwrap();

        let resp = h
            .app
            .oneshot(ocpi_request(
                Method::PATCH,
                TOKEN_PATH,
                Some(json!({"valid": false, "whitelist": "NEVER"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let token = h.store.lookup_token("012345678").await.unwrap().unwrap();
        assert!(!token.valid);
        assert_eq!(token.contract_id, "C1");
        assert_eq!(token.cache_mode, crate::domain::CacheMode::Never);
    }

    #[tokio::test]
    async fn start_session_reaches_connected_station() {
        let h = harness().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.sessions.register("00188", tx, OcppVersion::V16);
        h.store
            .set_runtime_details("00188", RuntimeDetails::new(OcppVersion::V16))
            .await
            .unwrap();

        let resp = h
            .app
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/START_SESSION",
                Some(start_session_body("DE*GCE*E00188*001")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[request_id::CORRELATION_ID_HEADER], "corr-42");
        let body = json_body(resp).await;
        assert_eq!(body["data"]["result"], "ACCEPTED");
        assert_eq!(body["data"]["timeout"], 30);

        let frame = OcppFrame::parse(&rx.recv().await.unwrap()).unwrap();
        match frame {
            OcppFrame::Call {
                action, payload, ..
            } => {
                assert_eq!(action, "RemoteStartTransaction");
                assert_eq!(payload["idTag"], "012345678");
                assert_eq!(payload["connectorId"], 1);
            }
            other => panic!("Expected Call, got {:?}", other),
        }
        assert_eq!(h.pending.len(), 1);
    }

    #[tokio::test]
    async fn start_session_outcomes() {
        let h = harness().await;

        // No runtime details for the station
        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/START_SESSION",
                Some(start_session_body("DE*GCE*E00999")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["data"]["result"], "REJECTED");

        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/START_SESSION",
                Some(start_session_body("not-an-evse")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["status_code"], 2001);

        let resp = h
            .app
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/START_SESSION",
                Some(json!({"response_url": "not a url"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(h.pending.is_empty());
    }

    #[tokio::test]
    async fn stop_unknown_session_and_unsupported_commands() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/STOP_SESSION",
                Some(json!({
                    "response_url": "https://emsp.example.com/ocpi/2.2/commands/STOP_SESSION/2",
                    "session_id": "00000000-0000-0000-0000-000000000007"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["data"]["result"], "UNKNOWN_SESSION");

        let resp = h
            .app
            .clone()
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/RESERVE_NOW",
                Some(json!({})),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["data"]["result"], "NOT_SUPPORTED");

        let resp = h
            .app
            .oneshot(ocpi_request(
                Method::POST,
                "/ocpi/receiver/2.2/commands/SELF_DESTRUCT",
                Some(json!({})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_and_openapi_are_public() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connected_charge_stations"], 0);

        let resp = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let doc = json_body(resp).await;
        assert!(doc["paths"]
            .get("/ocpi/receiver/2.2/commands/{command}")
            .is_some());

        let resp = h
            .app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
