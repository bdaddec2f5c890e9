use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub layout: LayoutConfig,
    pub notify: NotifyConfig,
    /// Maximum decoded upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Value for `Access-Control-Allow-Origin`
    pub cors_allow_origin: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON
    pub gcs_credentials_file: Option<String>,
    /// Inline GCS service account JSON, takes precedence over the file
    pub gcs_credentials_json: Option<String>,
    /// Storage emulator host; requests go there unauthenticated
    pub gcs_emulator_host: Option<String>,
    /// Prefix for public object URLs, without a trailing slash
    pub public_base_url: String,
}

/// Top-level folders of the bucket.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub home_root: String,
    pub albums_root: String,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub telegram_api_base: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_allow_origin: "*".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./files".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
            gcs_credentials_json: None,
            gcs_emulator_host: None,
            public_base_url: "http://localhost:8080/files".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            home_root: "home".to_string(),
            albums_root: "albuns".to_string(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_api_base: "https://api.telegram.org".to_string(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let cors_allow_origin =
            std::env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());

        let gcs_bucket = std::env::var("GCS_BUCKET").ok().filter(|s| !s.is_empty());
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();
        let gcs_credentials_json = std::env::var("GOOGLE_SERVICE_ACCOUNT_STORAGE").ok();
        let gcs_emulator_host = std::env::var("STORAGE_EMULATOR_HOST")
            .ok()
            .filter(|s| !s.is_empty());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .unwrap_or_else(|| match (&storage_backend, &gcs_bucket) {
                (StorageBackend::Gcs, Some(bucket)) => {
                    format!("https://storage.googleapis.com/{bucket}")
                }
                _ => "http://localhost:8080/files".to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        let home_root = std::env::var("HOME_ROOT").unwrap_or_else(|_| "home".to_string());
        let albums_root = std::env::var("ALBUMS_ROOT").unwrap_or_else(|_| "albuns".to_string());

        let telegram_api_base = std::env::var("TELEGRAM_API_BASE")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
        let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").ok();

        let config = Config {
            server: ServerConfig {
                bind_address,
                cors_allow_origin,
            },
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                gcs_bucket,
                gcs_credentials_file,
                gcs_credentials_json,
                gcs_emulator_host,
                public_base_url,
            },
            layout: LayoutConfig {
                home_root,
                albums_root,
            },
            notify: NotifyConfig {
                telegram_api_base,
                telegram_bot_token,
                telegram_chat_id,
            },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.storage.backend, StorageBackend::Gcs) && self.storage.gcs_bucket.is_none()
        {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when STORAGE_BACKEND=gcs".to_string(),
            ));
        }

        for (name, root) in [
            ("HOME_ROOT", &self.layout.home_root),
            ("ALBUMS_ROOT", &self.layout.albums_root),
        ] {
            if root.is_empty() || root.contains('/') {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a single non-empty path segment"
                )));
            }
        }

        if self.layout.home_root == self.layout.albums_root {
            return Err(ConfigError::ValidationError(
                "HOME_ROOT and ALBUMS_ROOT must differ".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.notify.telegram_bot_token.is_some() != self.notify.telegram_chat_id.is_some() {
            tracing::warn!(
                "Only one of TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID is set; \
                 access notifications are disabled."
            );
        }

        Ok(())
    }

    /// Body limit for the mutation endpoint: base64 inflates payloads by 4/3.
    pub fn mutation_body_limit(&self) -> usize {
        (self.max_upload_size as usize / 3 + 1) * 4 + 64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            layout: LayoutConfig::default(),
            notify: NotifyConfig::default(),
            max_upload_size: 1024,
        }
    }

    #[test]
    fn default_layout_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn gcs_requires_bucket() {
        let mut config = base();
        config.storage.backend = StorageBackend::Gcs;
        assert!(config.validate().is_err());

        config.storage.gcs_bucket = Some("bucket".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn roots_must_be_distinct_single_segments() {
        let mut config = base();
        config.layout.albums_root = "home".to_string();
        assert!(config.validate().is_err());

        let mut config = base();
        config.layout.home_root = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn body_limit_covers_base64_overhead() {
        let config = base();
        assert!(config.mutation_body_limit() > 1024 * 4 / 3);
    }
}
