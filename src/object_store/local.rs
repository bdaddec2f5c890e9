use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::{is_folder_marker, ObjectStore, ObjectStoreError};

/// Local filesystem object store for development and testing.
///
/// Folder markers map to directories; every directory below the base path is
/// listed back as a `dir/` marker key.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key.trim_end_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if is_folder_marker(key) {
            tokio::fs::create_dir_all(&path).await?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if is_folder_marker(key) {
            if path.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            }
        } else if path.is_file() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(key)?;
        if is_folder_marker(key) {
            Ok(path.is_dir())
        } else {
            Ok(path.is_file())
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let base = self.base_path.clone();
        let prefix = prefix.to_string();

        let keys = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ObjectStoreError> {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&base).min_depth(1) {
                let entry = entry.map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
                let Ok(relative) = entry.path().strip_prefix(&base) else {
                    continue;
                };
                let mut key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if entry.file_type().is_dir() {
                    key.push('/');
                }
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| ObjectStoreError::Backend(e.to_string()))??;

        Ok(keys)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let source = self.object_path(from)?;
        let target = self.object_path(to)?;

        if is_folder_marker(from) {
            tokio::fs::create_dir_all(&target).await?;
            return Ok(());
        }
        if !source.is_file() {
            return Err(ObjectStoreError::NotFound(from.to_string()));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, &target).await?;
        Ok(())
    }
}
