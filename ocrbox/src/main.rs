use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrbox::api::{create_router, AppState};
use ocrbox::config::Config;
use ocrbox::db::open_backend;
use ocrbox::ocr::{build_factory, EngineRegistry};
use ocrbox::storage::build_storage;

#[derive(Parser)]
#[command(name = "ocrbox")]
#[command(about = "Self-hostable OCR service")]
struct Args {
    /// Address to bind (overrides OCRBOX_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides OCRBOX_PORT)
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ocrbox=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "OCRBOX_API_KEYS is not set, OCR endpoints are locked. Set OCRBOX_API_KEYS to enable access."
        );
    }

    tracing::info!("Initializing result store...");
    let db = open_backend(&config.database).await?;

    tracing::info!(backend = ?config.storage.backend, "Initializing object storage...");
    let storage = build_storage(&config.storage)?;

    let factory = build_factory(&config.ocr);
    tracing::info!(
        "OCR backend: {} (default language {}, engines start on first use)",
        factory.name(),
        config.ocr.default_language
    );
    let engines = Arc::new(EngineRegistry::new(
        factory,
        config.ocr.default_language.clone(),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db, engines, storage);
    let app = create_router(state.clone());

    tracing::info!("Ocrbox starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI doc:  http://{}/api/v1/openapi.json", addr);

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.cancelled_owned())
        .await?;

    tracing::info!("Terminating OCR engines...");
    state.ocr.shutdown().await;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests...");
    cancel_token.cancel();
}
