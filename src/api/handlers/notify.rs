use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::notify::{format_message, VisitorLocation};
use crate::AppState;

/// Body of `POST /notify-access`. `text` may be any JSON scalar; numbers
/// and booleans are sent as their JSON rendering.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub text: Option<Value>,
}

impl NotifyRequest {
    pub fn text(&self) -> Option<String> {
        match self.text.as_ref()? {
            Value::String(text) => Some(text.clone()),
            scalar @ (Value::Number(_) | Value::Bool(_)) => Some(scalar.to_string()),
            _ => None,
        }
    }
}

/// `POST /notify-access`: forward a visit notice to the configured chat.
///
/// The body is parsed leniently: anything that does not carry a non-blank
/// `text` is rejected with the same 400.
pub async fn notify_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(notifier) = state.notifier.as_ref() else {
        return Err(ApiError::internal("Missing Telegram configuration"));
    };

    let text = serde_json::from_slice::<NotifyRequest>(&body)
        .ok()
        .and_then(|req| req.text())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing message text"))?;

    let location = VisitorLocation::from_headers(&headers);
    let message = format_message(&text, &location);

    notifier.send(&message).await.map_err(|e| {
        tracing::warn!(error = %e, "Access notification failed");
        ApiError::from(e)
    })?;

    tracing::info!(ip = location.ip.as_deref().unwrap_or("-"), "Access notification sent");
    Ok(StatusCode::NO_CONTENT)
}
