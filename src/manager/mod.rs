//! Administrative file operations over the `home/` and `albuns/` trees.
//!
//! The primitives here sanitize names and talk to the object store; which
//! paths may be touched at all is decided by [`PathPolicy`] in the caller.

mod policy;
mod sanitize;

pub use policy::PathPolicy;
pub use sanitize::{normalize_path, sanitize_file_name, sanitize_segment};

use std::collections::BTreeSet;
use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::gallery::{locale_cmp, ObjectPathResolver};
use crate::object_store::{is_folder_marker, ObjectStore, ObjectStoreError};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("{0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("File exceeds maximum upload size of {0} bytes")]
    PayloadTooLarge(u64),
    #[error(transparent)]
    Store(ObjectStoreError),
}

impl From<ObjectStoreError> for ManagerError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound(key) => ManagerError::NotFound(key),
            ObjectStoreError::InvalidKey(key) => {
                ManagerError::Validation(format!("invalid path: {key}"))
            }
            other => ManagerError::Store(other),
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Where an upload lands.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadTarget {
    /// An explicit folder path, e.g. the folder open in the file browser.
    Folder(String),
    Home,
    Album(String),
}

/// Result of a path-producing mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub url: String,
}

/// One directory level of the bucket, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerListing {
    pub current_path: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

// ============================================================================
// Manager
// ============================================================================

pub struct StorageManager {
    store: Arc<dyn ObjectStore>,
    resolver: ObjectPathResolver,
    layout: LayoutConfig,
    max_upload_size: u64,
}

impl StorageManager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        resolver: ObjectPathResolver,
        layout: LayoutConfig,
        max_upload_size: u64,
    ) -> Self {
        Self {
            store,
            resolver,
            layout,
            max_upload_size,
        }
    }

    /// Folder an upload target resolves to, without touching the store.
    pub fn upload_folder(&self, target: &UploadTarget) -> Result<String, ManagerError> {
        match target {
            UploadTarget::Home => Ok(self.layout.home_root.clone()),
            UploadTarget::Album(name) => {
                let name = sanitize_segment(name).ok_or_else(|| {
                    ManagerError::Validation("albumName is required for album uploads".into())
                })?;
                Ok(format!("{}/{name}", self.layout.albums_root))
            }
            UploadTarget::Folder(path) => match normalize_path(path) {
                Some(path) if !path.is_empty() => Ok(path),
                _ => Err(ManagerError::Validation(format!(
                    "invalid target path: '{path}'"
                ))),
            },
        }
    }

    pub async fn upload(
        &self,
        target: &UploadTarget,
        file_name: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<Mutation, ManagerError> {
        let folder = self.upload_folder(target)?;
        let file_name = sanitize_file_name(file_name);

        if data.len() as u64 > self.max_upload_size {
            return Err(ManagerError::PayloadTooLarge(self.max_upload_size));
        }

        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let path = format!("{folder}/{file_name}");
        self.store.put(&path, data, &content_type).await?;

        tracing::debug!(path = %path, content_type = %content_type, "Uploaded file");
        Ok(self.file_mutation(path))
    }

    pub async fn create_folder(&self, parent: &str, name: &str) -> Result<Mutation, ManagerError> {
        let parent = self.valid_path(parent)?;
        let name = sanitize_segment(name)
            .ok_or_else(|| ManagerError::Validation("folder name must not be empty".into()))?;

        let path = join(&parent, &name);
        if !self.store.list(&format!("{path}/")).await?.is_empty() {
            return Err(ManagerError::Conflict(path));
        }

        self.store
            .put(&format!("{path}/"), Bytes::new(), "application/x-directory")
            .await?;

        tracing::debug!(path = %path, "Created folder");
        Ok(Mutation { path, url: None })
    }

    pub async fn rename_folder(&self, path: &str, new_name: &str) -> Result<Mutation, ManagerError> {
        let path = self.valid_path(path)?;
        let new_name = sanitize_segment(new_name)
            .ok_or_else(|| ManagerError::Validation("new folder name must not be empty".into()))?;

        let new_path = join(parent_of(&path), &new_name);
        if new_path == path {
            return Ok(Mutation {
                path: new_path,
                url: None,
            });
        }

        let old_prefix = format!("{path}/");
        let new_prefix = format!("{new_path}/");

        let keys = self.store.list(&old_prefix).await?;
        if keys.is_empty() {
            return Err(ManagerError::NotFound(path));
        }
        if !self.store.list(&new_prefix).await?.is_empty() {
            return Err(ManagerError::Conflict(new_path));
        }

        for key in &keys {
            let moved = format!("{new_prefix}{}", &key[old_prefix.len()..]);
            self.store.copy(key, &moved).await?;
        }
        self.delete_keys(keys).await?;

        tracing::debug!(from = %path, to = %new_path, "Renamed folder");
        Ok(Mutation {
            path: new_path,
            url: None,
        })
    }

    pub async fn delete_folder(&self, path: &str) -> Result<Mutation, ManagerError> {
        let path = self.valid_path(path)?;
        let keys = self.store.list(&format!("{path}/")).await?;
        if keys.is_empty() {
            return Err(ManagerError::NotFound(path));
        }

        let count = keys.len();
        self.delete_keys(keys).await?;

        tracing::debug!(path = %path, objects = count, "Deleted folder");
        Ok(Mutation { path, url: None })
    }

    pub async fn rename_file(&self, path: &str, new_name: &str) -> Result<Mutation, ManagerError> {
        let path = self.valid_path(path)?;
        let new_name = sanitize_segment(new_name)
            .ok_or_else(|| ManagerError::Validation("new file name must not be empty".into()))?;

        if !self.store.exists(&path).await? {
            return Err(ManagerError::NotFound(path));
        }

        let new_path = join(parent_of(&path), &new_name);
        if new_path == path {
            return Ok(self.file_mutation(new_path));
        }
        if self.store.exists(&new_path).await? {
            return Err(ManagerError::Conflict(new_path));
        }

        self.store.copy(&path, &new_path).await?;
        self.store.delete(&path).await?;

        tracing::debug!(from = %path, to = %new_path, "Renamed file");
        Ok(self.file_mutation(new_path))
    }

    pub async fn delete_file(&self, path: &str) -> Result<Mutation, ManagerError> {
        let path = self.valid_path(path)?;
        if !self.store.exists(&path).await? {
            return Err(ManagerError::NotFound(path));
        }

        self.store.delete(&path).await?;

        tracing::debug!(path = %path, "Deleted file");
        Ok(Mutation { path, url: None })
    }

    /// Directory listing of one level. A missing folder lists as empty.
    pub async fn list(&self, path: &str) -> Result<ManagerListing, ManagerError> {
        let current_path = normalize_path(path)
            .ok_or_else(|| ManagerError::Validation(format!("invalid path: '{path}'")))?;
        let prefix = if current_path.is_empty() {
            String::new()
        } else {
            format!("{current_path}/")
        };

        let mut folder_names = BTreeSet::new();
        let mut files = Vec::new();

        for key in self.store.list(&prefix).await? {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((folder, _)) if !folder.is_empty() => {
                    folder_names.insert(folder.to_string());
                }
                Some(_) => {}
                None if !rest.is_empty() => files.push(FileEntry {
                    name: rest.to_string(),
                    path: key.clone(),
                    url: self.resolver.public_url(&key),
                }),
                None => {}
            }
        }

        let mut folders: Vec<FolderEntry> = folder_names
            .into_iter()
            .map(|name| FolderEntry {
                path: join(&current_path, &name),
                name,
            })
            .collect();
        folders.sort_by(|a, b| locale_cmp(&a.name, &b.name));
        files.sort_by(|a, b| locale_cmp(&a.name, &b.name));

        Ok(ManagerListing {
            current_path,
            folders,
            files,
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn valid_path(&self, path: &str) -> Result<String, ManagerError> {
        match normalize_path(path) {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(ManagerError::Validation(format!("invalid path: '{path}'"))),
        }
    }

    fn file_mutation(&self, path: String) -> Mutation {
        Mutation {
            url: Some(self.resolver.public_url(&path)),
            path,
        }
    }

    /// Files first, then folder markers deepest first.
    async fn delete_keys(&self, keys: Vec<String>) -> Result<(), ManagerError> {
        let (mut markers, files): (Vec<String>, Vec<String>) =
            keys.into_iter().partition(|k| is_folder_marker(k));
        markers.sort_by_key(|k| std::cmp::Reverse(k.len()));

        for key in files.iter().chain(markers.iter()) {
            self.store.delete(key).await?;
        }
        Ok(())
    }
}

/// Decode upload content sent as plain base64 or as a `data:` URL.
pub fn decode_base64_payload(input: &str) -> Result<Bytes, ManagerError> {
    let encoded = match input.split_once(',') {
        Some((_, payload)) => payload,
        None => input,
    };
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map(Bytes::from)
        .map_err(|e| ManagerError::Validation(format!("fileDataBase64 is not valid base64: {e}")))
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}
