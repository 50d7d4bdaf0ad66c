use actix_middleware::{JwtAuthMiddleware, JwtKeys, Logging};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use document_store::{DocumentStore, MemoryStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::info;

use interaction_service::config::Config;
use interaction_service::http::{self, AppState};
use interaction_service::logging::init_tracing;
use interaction_service::security::AccessRules;
use interaction_service::services::{CounterSettings, ServiceContext};
use interaction_service::workers::reconciler::{start_reconciler, ReconcilerConfig};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn load_store(seed_path: Option<&str>) -> Result<MemoryStore> {
    let Some(path) = seed_path else {
        return Ok(MemoryStore::new());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read store seed {}", path))?;
    let data: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in store seed {}", path))?;
    let store = MemoryStore::from_snapshot(data).context("Failed to load store seed")?;
    info!(path, "Store seeded from export");
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting interaction-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        http_port = config.app.http_port,
        reconcile_enabled = config.counters.reconcile_enabled,
        "Configuration loaded"
    );

    let store: Arc<dyn DocumentStore> =
        Arc::new(load_store(config.store.seed_path.as_deref()).await?);
    let rules = AccessRules::new(config.auth.admin_emails.iter());
    let context = ServiceContext::new(store, rules, CounterSettings::from(&config.counters));
    let keys = Arc::new(JwtKeys::from_secret(config.auth.jwt_secret.as_bytes()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut join_set: JoinSet<Result<()>> = JoinSet::new();

    let reconciler_config = ReconcilerConfig {
        enabled: config.counters.reconcile_enabled,
        interval: config.counters.reconcile_interval(),
    };
    let counters = context.system().counters;
    join_set.spawn(async move {
        start_reconciler(counters, reconciler_config, shutdown_rx).await;
        Ok(())
    });

    let state = web::Data::new(AppState::new(context));
    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(keys.clone()))
            .wrap(Logging)
            .configure(http::configure)
    })
    .disable_signals()
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind HTTP server to {}", http_addr))?
    .run();
    let server_handle = http_server.handle();

    join_set.spawn(async move {
        http_server
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
    });
    info!(addr = %http_addr, "HTTP server started");

    join_set.spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
        server_handle.stop(true).await;
        Ok(())
    });

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Task failed: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    info!("interaction-service stopped");
    Ok(())
}
