use std::time::Duration;

use dotenvy::dotenv;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use service::AppState;
use tracing::{error, info, warn};
use uuid::Uuid;

fn init_logging(debug: bool) {
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        common::utils::logging::init_logging_json(debug);
    } else {
        common::utils::logging::init_logging_default(debug);
    }
    info!(service = "server", event = "logger_init", "tracing subscriber initialized");
}

async fn connect(cfg: &configs::DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    if !cfg.is_configured() {
        warn!(service = "server", event = "storage_disabled", "database.url not set, running without a database");
        return Ok(DatabaseConnection::Disconnected);
    }

    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opts).await?;
    info!(service = "server", event = "storage_connected", "database connected");
    Ok(db)
}

async fn run(cfg: configs::AppConfig) -> anyhow::Result<AppState> {
    let storage = connect(&cfg.database).await?;
    let state = AppState::new(cfg, storage);
    state.init_default_services()?;
    Ok(state)
}

fn main() -> std::process::ExitCode {
    dotenv().ok();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default(false);
            error!(service = "server", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    init_logging(cfg.debug);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "server",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        host = %cfg.api.host,
        port = cfg.api.port,
        "server service starting"
    );

    rt.block_on(async move {
        let state = match run(cfg).await {
            Ok(state) => state,
            Err(e) => {
                error!(service = "server", event = "init_failed", error = %e, "service initialization failed");
                return std::process::ExitCode::FAILURE;
            }
        };

        info!(
            service = "server",
            event = "ready",
            %service_id,
            public_key = %state.authentication().map(|auth| auth.public_key().to_hex()).unwrap_or_default(),
            "services ready"
        );

        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(service = "server", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                if !matches!(state.storage(), DatabaseConnection::Disconnected) {
                    if let Err(e) = state.storage().clone().close().await {
                        warn!(service = "server", event = "storage_close_failed", error = %e, "closing database failed");
                    }
                }
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "server", event = "signal_failed", error = %e, "cannot listen for Ctrl+C");
                std::process::ExitCode::FAILURE
            }
        }
    })
}
