//! Texnouz OCPI Bridge
//!
//! OCPI 2.2 API for roaming partners plus the OCPP WebSocket endpoint for
//! charge stations. Reads configuration from TOML
//! (~/.config/texnouz-ocpi/config.toml, or `OCPI_BRIDGE_CONFIG`).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use texnouz_ocpi::application::commands::{
    CallMakers, CommandDispatcher, PendingCommands, ResultNotifier,
};
use texnouz_ocpi::application::evse::EvseResolver;
use texnouz_ocpi::application::handlers::InboundServices;
use texnouz_ocpi::application::session::SessionRegistry;
use texnouz_ocpi::application::transactions::{TransactionAuthorizer, TransactionRecorder};
use texnouz_ocpi::application::AuthGateway;
use texnouz_ocpi::config::{LogFormat, LoggingConfig};
use texnouz_ocpi::domain::{PartyStore, RegistrationStore, StoreProvider};
use texnouz_ocpi::infrastructure::{HttpCallbackSender, InMemoryStore, SessionEmitter};
use texnouz_ocpi::interfaces::http::common::OcpiIdentity;
use texnouz_ocpi::interfaces::ws::OcppServer;
use texnouz_ocpi::shared::shutdown::ShutdownCoordinator;
use texnouz_ocpi::{config_path_from_env, create_api_router, AppConfig, ApiState};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Load registrations and partner credentials listed in the config.
async fn seed_store(store: &InMemoryStore, app_cfg: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    for credential in &app_cfg.ocpi.registrations {
        store.set_registration_details(credential.clone()).await?;
    }
    for party in &app_cfg.ocpi.parties {
        store.set_party_details(party.clone()).await?;
    }
    info!(
        registrations = app_cfg.ocpi.registrations.len(),
        parties = app_cfg.ocpi.parties.len(),
        "Seeded OCPI credentials"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&app_cfg.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting Texnouz OCPI Bridge...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))?;
    info!("📊 Prometheus metrics recorder installed");

    // ── Storage ────────────────────────────────────────────────
    let store = Arc::new(InMemoryStore::new());
    seed_store(&store, &app_cfg).await?;
    let stores: Arc<dyn StoreProvider> = store;

    // ── Sessions, callbacks and pending commands ───────────────
    let sessions = SessionRegistry::shared();
    let commands_cfg = &app_cfg.commands;
    let callback_sender = HttpCallbackSender::new(
        Duration::from_millis(commands_cfg.callback_connect_timeout_ms),
        Duration::from_secs(commands_cfg.callback_timeout_secs),
    )?;
    let notifier = Arc::new(ResultNotifier::new(
        Arc::new(callback_sender),
        stores.clone(),
        commands_cfg.callback_retry(),
    ));
    let pending = Arc::new(PendingCommands::new(notifier));

    // ── Command dispatcher (one CallMaker per supported OCPP version) ──
    let dispatcher = Arc::new(CommandDispatcher::new(
        stores.clone(),
        EvseResolver::new(&app_cfg.ocpi.evse_id_pattern)?,
        CallMakers::supported(),
        Arc::new(SessionEmitter::new(sessions.clone())),
        pending.clone(),
        commands_cfg.dispatch_timeouts(),
    ));

    let services = Arc::new(InboundServices {
        authorizer: TransactionAuthorizer::new(stores.clone()),
        recorder: TransactionRecorder::new(stores.clone()),
        pending: pending.clone(),
    });

    // Initialize shutdown coordinator
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout_secs);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    tokio::spawn(
        pending
            .clone()
            .run_sweeper(commands_cfg.sweep_interval(), shutdown_signal.clone()),
    );

    // OCPP WebSocket server with shutdown support
    let server = OcppServer::new(app_cfg.ws_address(), sessions.clone(), stores.clone(), services)
        .with_shutdown(shutdown_signal.clone());

    // ── OCPI REST API ──────────────────────────────────────────
    let api_router = create_api_router(ApiState {
        stores: stores.clone(),
        gateway: Arc::new(AuthGateway::new(stores)),
        dispatcher,
        sessions,
        pending,
        identity: OcpiIdentity {
            country_code: app_cfg.ocpi.country_code.clone(),
            party_id: app_cfg.ocpi.party_id.clone(),
            base_url: app_cfg.ocpi.base_url.clone(),
        },
        metrics: prometheus_handle,
        started_at: Arc::new(Instant::now()),
    });

    let api_addr = app_cfg.api_address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("OCPI API listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 OCPI API server received shutdown signal");
    });

    info!("🚀 All servers started. Press Ctrl+C to shutdown gracefully.");

    let ws_result = tokio::spawn(async move { server.run().await });
    let api_result = tokio::spawn(async move { api_server.await });

    tokio::select! {
        result = ws_result => {
            match result {
                Ok(Ok(())) => info!("WebSocket server stopped"),
                Ok(Err(e)) => error!("WebSocket server error: {}", e),
                Err(e) => error!("WebSocket server task panicked: {}", e),
            }
        }
        result = api_result => {
            match result {
                Ok(Ok(())) => info!("OCPI API server stopped"),
                Ok(Err(e)) => error!("OCPI API server error: {}", e),
                Err(e) => error!("OCPI API server task panicked: {}", e),
            }
        }
    }

    // Give in-flight callbacks a moment to finish
    shutdown_signal.trigger();
    let drained = shutdown
        .shutdown_with_cleanup(|| async { tokio::time::sleep(Duration::from_millis(200)).await })
        .await;
    if !drained {
        warn!("Shutdown cleanup did not finish in time");
    }

    info!("👋 Texnouz OCPI Bridge shutdown complete");
    Ok(())
}
