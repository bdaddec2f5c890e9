//! Shared test helpers for in-crate handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{Config, LayoutConfig, NotifyConfig, ServerConfig, StorageConfig};
use crate::notify::{Notifier, NotifyError};
use crate::object_store::LocalStore;
use crate::AppState;

pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            cors_allow_origin: "*".to_string(),
        },
        storage: StorageConfig {
            local_storage_path: temp_dir.path().join("files").to_string_lossy().to_string(),
            public_base_url: "https://cdn.test/bucket".to_string(),
            ..StorageConfig::default()
        },
        layout: LayoutConfig::default(),
        notify: NotifyConfig::default(),
        max_upload_size: 1024 * 1024, // 1MB for tests
    }
}

/// Create a test AppState backed by a local object store in `temp_dir`.
pub fn test_state(
    temp_dir: &tempfile::TempDir,
    notifier: Option<Arc<dyn Notifier>>,
) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let object_store = LocalStore::new(&config.storage.local_storage_path)
        .expect("Failed to create test object store");
    Arc::new(AppState::new(config, Arc::new(object_store), notifier))
}

/// Notifier that records messages, or fails with a fixed upstream error.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail_with: Option<(u16, String)>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if let Some((status, details)) = &self.fail_with {
            return Err(NotifyError::Upstream {
                status: *status,
                details: details.clone(),
            });
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
