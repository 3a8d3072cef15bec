//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the controller drives the use cases.

use dotenv::dotenv;
use fit_together::adapters::firebase::{FirebaseAuthAdapter, FirestoreAdapter};
use fit_together::adapters::memory::{MemoryDocumentStore, MemoryIdentityProvider};
use fit_together::adapters::persistence::{SessionFile, SqliteBackend};
use fit_together::adapters::ui::tui::TuiInputPort;
use fit_together::app::{AppController, Services};
use fit_together::ports::{DocumentStore, IdentityProvider, InputPort};
use fit_together::shared::config::{AppConfig, Backend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    fit_together::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });

    let (identity, store) = build_backend(&cfg).await?;

    let services = Arc::new(Services::new(
        identity,
        store,
        cfg.profile_write_attempts_or_default(),
    ));
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        AppController::new(services),
        cfg.carousel_interval_or_default(),
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// Identity provider and document store for the configured backend.
async fn build_backend(
    cfg: &AppConfig,
) -> anyhow::Result<(Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>)> {
    match cfg.backend_or_default() {
        Backend::Memory => {
            info!("backend: memory (nothing is persisted)");
            Ok((
                Arc::new(MemoryIdentityProvider::new()),
                Arc::new(MemoryDocumentStore::new()),
            ))
        }
        Backend::Local => {
            let data_path = cfg.data_dir_or_default();
            let data_dir_abs = data_path
                .canonicalize()
                .unwrap_or_else(|_| data_path.clone());
            info!(path = %data_dir_abs.display(), "backend: local");
            let backend = Arc::new(
                SqliteBackend::connect(&data_path)
                    .await
                    .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
            );
            let identity: Arc<dyn IdentityProvider> = Arc::clone(&backend) as Arc<dyn IdentityProvider>;
            let store: Arc<dyn DocumentStore> = backend;
            Ok((identity, store))
        }
        Backend::Firebase => {
            let Some((api_key, project_id)) = cfg.firebase_credentials() else {
                anyhow::bail!(
                    "Set FIT_TOGETHER_FIREBASE_API_KEY and FIT_TOGETHER_FIREBASE_PROJECT_ID (env or .env) for the firebase backend"
                );
            };
            let data_path = cfg.data_dir_or_default();
            let client = reqwest::Client::builder()
                .timeout(cfg.request_timeout_or_default())
                .build()?;
            info!(project = %project_id, "backend: firebase");
            Ok((
                Arc::new(FirebaseAuthAdapter::new(
                    client.clone(),
                    api_key,
                    SessionFile::new(data_path.join("session.json")),
                )),
                Arc::new(FirestoreAdapter::new(client, project_id)),
            ))
        }
    }
}
