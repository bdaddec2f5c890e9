use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::manager::normalize_path;
use crate::AppState;

/// Serve raw object bytes.
/// Route: GET /files/*path
///
/// Public URLs produced by the resolver point here when the local backend
/// is in use; axum has already percent-decoded the path.
pub async fn serve_object(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let key = normalize_path(&path)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let data = state.object_store.get(&key).await.map_err(|e| match e {
        crate::object_store::ObjectStoreError::NotFound(_) => ApiError::not_found("File not found"),
        other => ApiError::from(other),
    })?;

    let mime = mime_guess::from_path(&key).first_or_octet_stream();
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime.as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=300"),
    );

    Ok(response)
}
