use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// `GET /storage-list`: the public site listing, or one directory level of
/// the bucket with `?mode=manager&path=...`.
pub async fn storage_list(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Response, ApiError> {
    match params.mode.as_deref() {
        None | Some("") | Some("site") => {
            let keys = state.object_store.list("").await?;
            let listing = state.resolver.resolve(keys.iter().map(String::as_str));

            tracing::debug!(
                objects = keys.len(),
                home_photos = listing.home_photos.len(),
                albums = listing.albums.len(),
                "Built site listing"
            );
            Ok(Json(listing).into_response())
        }
        Some("manager") => {
            let path = params.path.unwrap_or_default();
            let listing = state.manager.list(&path).await?;
            Ok(Json(listing).into_response())
        }
        Some(other) => Err(ApiError::bad_request(format!(
            "unknown mode '{other}', expected 'manager'"
        ))),
    }
}
