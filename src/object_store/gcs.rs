use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{ObjectStore, ObjectStoreError};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_STORAGE_API: &str = "https://storage.googleapis.com";

/// Object names travel as a single path segment, so `/` is escaped too.
const OBJECT_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Where the store gets its OAuth access tokens from.
#[derive(Debug, Clone)]
pub enum GcsCredentials {
    ServiceAccountFile(String),
    ServiceAccountJson(String),
    /// Application default credentials on GCE / Cloud Run.
    MetadataServer,
    /// No `Authorization` header, for storage emulators.
    Anonymous,
}

/// Google Cloud Storage object store backend.
pub struct GcsStore {
    api_base: String,
    bucket: String,
    client: Client,
    access_token: tokio::sync::RwLock<CachedToken>,
    credentials: GcsCredentials,
}

#[derive(Default)]
struct CachedToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        // Tokens within a minute of expiry count as stale.
        matches!(self.expires_at, Some(at) if at - Duration::seconds(60) > Utc::now())
    }
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    items: Vec<ListedObject>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ListedObject {
    name: String,
}

impl GcsStore {
    /// `api_base` is the JSON API host, [`DEFAULT_STORAGE_API`] outside of
    /// emulators and tests.
    pub async fn new(
        api_base: &str,
        bucket: &str,
        credentials: GcsCredentials,
    ) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;

        let store = Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            client,
            access_token: tokio::sync::RwLock::new(CachedToken::default()),
            credentials,
        };

        if !matches!(store.credentials, GcsCredentials::Anonymous) {
            store.refresh_token().await?;
        }
        Ok(store)
    }

    /// Attach the bearer token, refreshing it first when stale.
    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder, ObjectStoreError> {
        if matches!(self.credentials, GcsCredentials::Anonymous) {
            return Ok(req);
        }
        Ok(req.bearer_auth(self.token().await?))
    }

    async fn token(&self) -> Result<String, ObjectStoreError> {
        {
            let cached = self.access_token.read().await;
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }
        self.refresh_token()
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("Could not obtain access token: {e}")))
    }

    async fn refresh_token(&self) -> Result<String, anyhow::Error> {
        let resp = match &self.credentials {
            GcsCredentials::ServiceAccountFile(path) => {
                let key_json = tokio::fs::read_to_string(path).await?;
                self.token_from_service_account(&key_json).await?
            }
            GcsCredentials::ServiceAccountJson(key_json) => {
                self.token_from_service_account(key_json).await?
            }
            GcsCredentials::MetadataServer => self.token_from_metadata_server().await?,
            GcsCredentials::Anonymous => anyhow::bail!("anonymous credentials carry no token"),
        };

        let expires_in = resp.expires_in.unwrap_or(3600);
        let mut lock = self.access_token.write().await;
        *lock = CachedToken {
            value: resp.access_token.clone(),
            expires_at: Some(Utc::now() + Duration::seconds(expires_in)),
        };
        tracing::debug!(expires_in, "Refreshed GCS access token");
        Ok(resp.access_token)
    }

    async fn token_from_service_account(
        &self,
        key_json: &str,
    ) -> Result<TokenResponse, anyhow::Error> {
        let key: ServiceAccountKey = serde_json::from_str(key_json)?;
        let token_uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": key.client_email,
            "scope": "https://www.googleapis.com/auth/devstorage.read_write",
            "aud": token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        // Build JWT (header.claims.signature)
        let header = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
            "alg": "RS256",
            "typ": "JWT"
        }))?);
        let payload = base64_url_encode(&serde_json::to_vec(&claims)?);
        let unsigned = format!("{header}.{payload}");

        let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
        let jwt = format!("{unsigned}.{}", base64_url_encode(&signature));

        let resp = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let details = resp.text().await.unwrap_or_default();
            anyhow::bail!("token endpoint rejected the assertion: {details}");
        }

        Ok(resp.json().await?)
    }

    async fn token_from_metadata_server(&self) -> Result<TokenResponse, anyhow::Error> {
        let resp: TokenResponse = self
            .client
            .get("http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token")
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }

    fn objects_url(&self) -> String {
        format!("{}/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.objects_url(), encode_object_name(key))
    }

    fn copy_url(&self, from: &str, to: &str) -> String {
        format!(
            "{}/copyTo/b/{}/o/{}",
            self.object_url(from),
            self.bucket,
            encode_object_name(to)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let req = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", key)])
            .header("Content-Type", content_type)
            .body(data);
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        ensure_success(resp, key).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let req = self
            .client
            .get(self.object_url(key))
            .query(&[("alt", "media")]);
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        let resp = ensure_success(resp, key).await?;
        let data = resp
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        Ok(data)
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let req = self.client.delete(self.object_url(key));
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        // 404 is fine -- object already gone
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(resp, key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let req = self.client.get(self.object_url(key));
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(resp, key).await?;
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("fields", "items(name),nextPageToken")];
            if !prefix.is_empty() {
                query.push(("prefix", prefix));
            }
            if let Some(ref next) = page_token {
                query.push(("pageToken", next.as_str()));
            }

            let req = self.client.get(self.objects_url()).query(&query);
            let resp = self
                .authorize(req)
                .await?
                .send()
                .await
                .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

            let page: ListPage = ensure_success(resp, prefix)
                .await?
                .json()
                .await
                .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

            keys.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let req = self.client.post(self.copy_url(from, to));
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        ensure_success(resp, from).await?;
        Ok(())
    }
}

/// Pass the upstream status and body through untouched on failure.
async fn ensure_success(resp: Response, key: &str) -> Result<Response, ObjectStoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ObjectStoreError::NotFound(key.to_string()));
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ObjectStoreError::Upstream {
        status: status.as_u16(),
        message,
    })
}

fn encode_object_name(key: &str) -> String {
    utf8_percent_encode(key, OBJECT_NAME).to_string()
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, anyhow::Error> {
    // Strip PEM armor and whitespace, then decode the PKCS#8 DER body
    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    let der = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &der_b64)?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| anyhow::anyhow!("Failed to parse RSA key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign: {e}"))?;

    Ok(signature)
}
