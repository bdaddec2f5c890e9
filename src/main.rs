use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_portfolio::{
    api,
    config::{Config, StorageBackend, StorageConfig},
    notify::{Notifier, TelegramNotifier},
    object_store as obj, AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "photo-portfolio starting");

    let config = Config::load()?;
    info!(
        home = %config.layout.home_root,
        albums = %config.layout.albums_root,
        public_base_url = %config.storage.public_base_url,
        "Loaded configuration"
    );

    let object_store = open_object_store(&config.storage).await?;

    let notifier: Option<Arc<dyn Notifier>> = match (
        config.notify.telegram_bot_token.as_deref(),
        config.notify.telegram_chat_id.as_deref(),
    ) {
        (Some(token), Some(chat_id)) => {
            let notifier =
                TelegramNotifier::new(&config.notify.telegram_api_base, token, chat_id)?;
            info!("Access notifications enabled");
            Some(Arc::new(notifier))
        }
        _ => {
            info!("Access notifications disabled");
            None
        }
    };

    let bind_address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(config, object_store, notifier));

    // Build and start the HTTP server
    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn open_object_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn obj::ObjectStore>> {
    match storage.backend {
        StorageBackend::Local => {
            let store = obj::LocalStore::new(&storage.local_storage_path)?;
            info!(
                "Using local storage backend at: {}",
                storage.local_storage_path
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Gcs => {
            let bucket = storage
                .gcs_bucket
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("GCS_BUCKET is required for the gcs backend"))?;

            let (api_base, credentials) = match &storage.gcs_emulator_host {
                Some(host) => (host.as_str(), obj::GcsCredentials::Anonymous),
                None => (
                    obj::DEFAULT_STORAGE_API,
                    match (&storage.gcs_credentials_json, &storage.gcs_credentials_file) {
                        (Some(json), _) => obj::GcsCredentials::ServiceAccountJson(json.clone()),
                        (None, Some(path)) => obj::GcsCredentials::ServiceAccountFile(path.clone()),
                        (None, None) => obj::GcsCredentials::MetadataServer,
                    },
                ),
            };

            let store = obj::GcsStore::new(api_base, bucket, credentials).await?;
            info!("Using GCS storage backend at {}, bucket: {}", api_base, bucket);
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}
