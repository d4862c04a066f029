//! REST client for the Timebox Track backend
//!
//! Thin wrapper over `reqwest` that:
//! - attaches the session's bearer token to every request
//! - unwraps `{ success, message, data }` envelopes
//! - normalizes field names before deserialization
//! - clears the session on 401 (forced logout)

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::envelope::{error_message, unwrap_envelope};
use super::normalize::normalize;
use crate::config::ApiConfig;
use crate::domain::attachment::UploadFile;
use crate::error::{Error, Result};
use crate::infrastructure::session::{Session, SessionStore};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend HTTP client
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
    session: Arc<SessionStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.session.is_authenticated())
            .finish()
    }
}

/// Builder for creating an ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    session: Option<Arc<SessionStore>>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL (e.g. `http://localhost:3000/api`)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Share a session store
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigError("API base URL is required".to_string()))?;

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(Error::NetworkError)?;

        Ok(ApiClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: self
                .session
                .unwrap_or_else(|| Arc::new(SessionStore::in_memory(Session::default()))),
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Client configured from the `[api]` section
    pub fn from_config(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
        Self::builder()
            .base_url(config.resolved_base_url())
            .timeout_secs(config.timeout_secs)
            .session(session)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http_client.request(method, self.url(path));
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the unwrapped, normalized payload
    async fn execute(&self, method: &Method, path: &str, request: RequestBuilder) -> Result<Value> {
        debug!(method = %method, path = %path, "Sending request");

        let response = request.send().await.map_err(|e| {
            error!(method = %method, path = %path, error = %e, "Request failed");
            Error::NetworkError(e)
        })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(method = %method, path = %path, "Unauthorized, clearing session");
            self.session.clear();
            return Err(Error::Unauthorized);
        }

        let text = response.text().await.map_err(Error::NetworkError)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            let message = error_message(&body)
                .or_else(|| body.as_str().map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!(method = %method, path = %path, status = status.as_u16(), message = %message, "Request rejected");
            return Err(Error::api(status.as_u16(), message));
        }

        let data = unwrap_envelope(body, status.as_u16())?;
        Ok(normalize(data))
    }

    fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidResponse(format!("{}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self
            .execute(&Method::GET, path, self.request(Method::GET, path))
            .await?;
        Self::decode(path, value)
    }

    /// GET that maps 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get::<Value>(path).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Self::decode(path, value).map(Some),
            Err(Error::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        let value = self.execute(&Method::GET, path, request).await?;
        Self::decode(path, value)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(&Method::DELETE, path, self.request(Method::DELETE, path))
            .await?;
        Ok(())
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method.clone(), path).json(body);
        let value = self.execute(&method, path, request).await?;
        Self::decode(path, value)
    }

    /// POST a single file as `multipart/form-data`
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        file: UploadFile,
    ) -> Result<T> {
        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(Error::NetworkError)?;
        let form = Form::new().part(field.to_string(), part);
        debug!(path = %path, file = %file.file_name, size, "Uploading file");

        let request = self.request(Method::POST, path).multipart(form);
        let value = self.execute(&Method::POST, path, request).await?;
        Self::decode(path, value)
    }
}
