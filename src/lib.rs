//! photo-portfolio - Backend functions and viewer core for a photographer portfolio
//!
//! This crate provides:
//! - Album / home photo listing computed from object-store paths
//! - Scoped file and folder management over the bucket (upload, rename, delete)
//! - Access notifications forwarded to a chat bot
//! - Swappable object storage backends (local filesystem, GCS)
//! - The photo-viewer interaction core (pinch/pan/swipe gestures, clamped
//!   panning, slide rotation) and an HTTP client for the API

pub mod api;
pub mod client;
pub mod config;
pub mod gallery;
pub mod manager;
pub mod notify;
pub mod object_store;
#[cfg(test)]
pub mod testutil;
pub mod viewer;

use std::sync::Arc;

use config::Config;
use gallery::ObjectPathResolver;
use manager::{PathPolicy, StorageManager};
use notify::Notifier;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub object_store: Arc<dyn object_store::ObjectStore>,
    pub resolver: ObjectPathResolver,
    pub manager: StorageManager,
    pub policy: PathPolicy,
    /// `None` when no chat bot is configured
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    pub fn new(
        config: Config,
        object_store: Arc<dyn object_store::ObjectStore>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let resolver = ObjectPathResolver::new(&config.layout, &config.storage);
        let manager = StorageManager::new(
            Arc::clone(&object_store),
            resolver.clone(),
            config.layout.clone(),
            config.max_upload_size,
        );
        let policy = PathPolicy::new(&config.layout);

        Self {
            config,
            object_store,
            resolver,
            manager,
            policy,
            notifier,
        }
    }
}
