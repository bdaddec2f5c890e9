use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::manager::ManagerError;
use crate::notify::NotifyError;
use crate::object_store::ObjectStoreError;

// ============================================================================
// Error body
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Either a client error (4xx) or a server / upstream error (5xx, or whatever
/// status the upstream provider answered with).
#[derive(Debug)]
pub enum ApiError {
    Fail(StatusCode, String),
    Error(StatusCode, String, Option<String>),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::Fail(code, error) => (
                code,
                ErrorBody {
                    error,
                    details: None,
                },
            ),
            ApiError::Error(code, error, details) => (code, ErrorBody { error, details }),
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::NOT_FOUND, message.into())
    }

    pub fn method_not_allowed() -> Self {
        ApiError::Fail(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::PAYLOAD_TOO_LARGE, message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::CONFLICT, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Error(StatusCode::INTERNAL_SERVER_ERROR, message.into(), None)
    }

    pub fn bad_gateway(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Error(StatusCode::BAD_GATEWAY, message.into(), Some(details.into()))
    }

    /// Surface an upstream failure with the provider's own status.
    pub fn upstream(status: u16, message: impl Into<String>, details: impl Into<String>) -> Self {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        ApiError::Error(code, message.into(), Some(details.into()))
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound(key) => ApiError::not_found(format!("Not found: {key}")),
            ObjectStoreError::InvalidKey(key) => ApiError::bad_request(format!("Invalid path: {key}")),
            ObjectStoreError::Upstream { status, message } => {
                ApiError::upstream(status, "Object store request failed", message)
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(e: ManagerError) -> Self {
        match e {
            ManagerError::Validation(message) => ApiError::bad_request(message),
            ManagerError::NotFound(path) => ApiError::not_found(format!("Not found: {path}")),
            ManagerError::Conflict(path) => ApiError::conflict(format!("Already exists: {path}")),
            ManagerError::PayloadTooLarge(limit) => ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {limit} bytes"
            )),
            ManagerError::Store(inner) => inner.into(),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::Upstream { details, .. } => ApiError::bad_gateway("Telegram error", details),
            NotifyError::Transport(details) => ApiError::bad_gateway("Telegram error", details),
        }
    }
}

// ============================================================================
// Custom extractors (reject with an ApiError body)
// ============================================================================

/// Drop-in replacement for `axum::Json` that rejects with an `ApiError`.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid request body: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".into(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".into()
                    }
                    JsonRejection::BytesRejection(err) => {
                        return Err(ApiError::Fail(err.status(), err.body_text()));
                    }
                    _ => "Failed to read request body".into(),
                };
                Err(ApiError::bad_request(message))
            }
        }
    }
}

/// Drop-in replacement for `axum::extract::Query` that rejects with an `ApiError`.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(format!("Invalid query parameter: {e}")))
    }
}
