//! HTTP client for the portfolio API, as used by the public site and the
//! manager UI.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::handlers::{MutationRequest, NotifyRequest};
use crate::api::response::ErrorBody;
use crate::gallery::SiteListing;
use crate::manager::{ManagerListing, Mutation};
use crate::viewer::ImageSource;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Server returned {status}: {error}")]
    Upstream {
        status: u16,
        error: String,
        details: Option<String>,
    },
    #[error("Expected a JSON response, got '{0}'")]
    UnexpectedContentType(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct PortfolioClient {
    http: Client,
    base_url: String,
}

impl PortfolioClient {
    /// `base_url` is the API root, e.g. `https://example.com/api`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::with_client(Client::builder().build()?, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{route}", self.base_url)
    }

    pub async fn fetch_site(&self) -> Result<SiteListing, ClientError> {
        let resp = self.http.get(self.url("storage-list")).send().await?;
        json_body(resp).await
    }

    pub async fn list_manager(&self, path: &str) -> Result<ManagerListing, ClientError> {
        let resp = self
            .http
            .get(self.url("storage-list"))
            .query(&[("mode", "manager"), ("path", path)])
            .send()
            .await?;
        json_body(resp).await
    }

    pub async fn mutate(&self, request: &MutationRequest) -> Result<Mutation, ClientError> {
        let resp = self
            .http
            .post(self.url("storage-upload"))
            .json(request)
            .send()
            .await?;
        json_body(resp).await
    }

    pub async fn notify_access(&self, text: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("notify-access"))
            .json(&NotifyRequest {
                text: Some(text.into()),
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error(resp).await);
        }
        Ok(())
    }

    /// Raw bytes of a public image URL.
    pub async fn fetch_image(&self, src: &str) -> Result<Bytes, ClientError> {
        let resp = self.http.get(src).send().await?;
        if !resp.status().is_success() {
            return Err(upstream_error(resp).await);
        }
        Ok(resp.bytes().await?)
    }
}

#[async_trait]
impl ImageSource for PortfolioClient {
    async fn fetch_image(&self, src: &str) -> Result<Bytes, ClientError> {
        PortfolioClient::fetch_image(self, src).await
    }
}

async fn json_body<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(upstream_error(resp).await);
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("application/json") {
        return Err(ClientError::UnexpectedContentType(content_type));
    }

    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

async fn upstream_error(resp: Response) -> ClientError {
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or_default();

    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(ErrorBody { error, details }) => ClientError::Upstream {
            status: status.as_u16(),
            error,
            details,
        },
        Err(_) => ClientError::Upstream {
            status: status.as_u16(),
            error: reason(status),
            details: (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned()),
        },
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown status")
        .to_string()
}
