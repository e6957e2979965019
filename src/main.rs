use std::sync::Arc;

use anyhow::Context;
use homebase::api::{AppState, router};
use homebase::config::{AppConfig, ConfigStatus};
use homebase::session::Session;
use homebase::store::{LibSqlStore, RestStore, TableStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    eprintln!("🏠 Homebase v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api/dashboard", config.bind);

    // ── Store ────────────────────────────────────────────────────────────
    let store: Arc<dyn TableStore> = match (&config.rest, &config.store_status) {
        (Some(rest), _) => {
            tracing::info!(url = %rest.url, "Using hosted REST store");
            Arc::new(RestStore::new(rest))
        }
        (None, status) => {
            if let ConfigStatus::NotConfigured { reason } = status {
                tracing::warn!(%reason, "Hosted store not configured, using local database");
            }
            let store = LibSqlStore::new_local(&config.db_path)
                .await
                .map_err(|e| {
                    tracing::error!(path = %config.db_path.display(), error = %e, "Failed to open database");
                    e
                })
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            tracing::info!(path = %config.db_path.display(), "Local database ready");
            Arc::new(store)
        }
    };

    // ── HTTP ─────────────────────────────────────────────────────────────
    let state = AppState::new(store, Session::new(config.user_id), config.store_status.clone());
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Homebase API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("serving HTTP")?;

    Ok(())
}
