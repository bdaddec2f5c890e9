use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson};
use crate::manager::{decode_base64_payload, normalize_path, Mutation, UploadTarget};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Upload,
    CreateFolder,
    RenameFolder,
    DeleteFolder,
    RenameFile,
    DeleteFile,
}

/// Body of `POST /storage-upload`. Which fields are required depends on
/// `operation`; a body without one is an upload.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    #[serde(default)]
    pub operation: Option<Operation>,
    // upload
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_data_base64: Option<String>,
    // folder / file operations
    #[serde(default)]
    pub parent_path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn storage_mutation(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<MutationRequest>,
) -> Result<Json<Mutation>, ApiError> {
    let operation = req.operation.unwrap_or(Operation::Upload);

    let result = match operation {
        Operation::Upload => upload(&state, &req).await?,
        Operation::CreateFolder => {
            let parent = checked_path(req.parent_path.as_deref(), "parentPath")?;
            let name = required(req.name.as_deref(), "name")?;
            state.policy.check_create_folder(&parent)?;
            state.manager.create_folder(&parent, name).await?
        }
        Operation::RenameFolder => {
            let path = checked_path(req.path.as_deref(), "path")?;
            let new_name = required(req.new_name.as_deref(), "newName")?;
            state.policy.check_modify_folder(&path)?;
            state.manager.rename_folder(&path, new_name).await?
        }
        Operation::DeleteFolder => {
            let path = checked_path(req.path.as_deref(), "path")?;
            state.policy.check_modify_folder(&path)?;
            state.manager.delete_folder(&path).await?
        }
        Operation::RenameFile => {
            let path = checked_path(req.path.as_deref(), "path")?;
            let new_name = required(req.new_name.as_deref(), "newName")?;
            state.policy.check_modify_file(&path)?;
            state.manager.rename_file(&path, new_name).await?
        }
        Operation::DeleteFile => {
            let path = checked_path(req.path.as_deref(), "path")?;
            state.policy.check_modify_file(&path)?;
            state.manager.delete_file(&path).await?
        }
    };

    tracing::info!(?operation, path = %result.path, "Storage mutation applied");
    Ok(Json(result))
}

async fn upload(state: &AppState, req: &MutationRequest) -> Result<Mutation, ApiError> {
    let (Some(data), Some(file_name)) = (
        req.file_data_base64.as_deref().filter(|s| !s.is_empty()),
        req.file_name.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "fileDataBase64 and fileName are required",
        ));
    };

    let target = match (req.target_path.as_deref(), req.category.as_deref()) {
        (Some(path), _) => UploadTarget::Folder(path.to_string()),
        (None, Some("home")) => UploadTarget::Home,
        (None, Some("album")) => UploadTarget::Album(req.album_name.clone().unwrap_or_default()),
        _ => {
            return Err(ApiError::bad_request(
                "category must be 'home' or 'album' when targetPath is absent",
            ))
        }
    };

    let folder = state.manager.upload_folder(&target)?;
    state.policy.check_upload(&folder)?;

    let bytes = decode_base64_payload(data)?;
    let result = state
        .manager
        .upload(&target, file_name, bytes, req.content_type.as_deref())
        .await?;
    Ok(result)
}

// ============================================================================
// Helpers
// ============================================================================

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is required")))
}

fn checked_path(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    let raw = required(value, field)?;
    normalize_path(raw)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is not a valid path")))
}
