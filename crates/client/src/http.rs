//! Shared HTTP plumbing: cookie session, CSRF token, JSON mapping.

use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Header carrying the CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Endpoint issuing the CSRF token (`{"csrfToken": "..."}`).
pub const CSRF_PATH: &str = "/api/csrf/";

#[derive(Debug, serde::Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    csrf_token: RwLock<Option<String>>,
}

/// Cookie-session HTTP client for the portal backend.
///
/// Cheap to clone; clones share the cookie jar and the CSRF token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                csrf_token: RwLock::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn url(&self, path: &str) -> String {
        self.inner.config.url(path)
    }

    pub fn csrf_token(&self) -> Option<String> {
        match self.inner.csrf_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        let mut guard = match self.inner.csrf_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    /// Fetch a fresh CSRF token and remember it for later requests.
    pub async fn fetch_csrf_token(&self) -> Result<String, ClientError> {
        let response: CsrfResponse = self.get_json(CSRF_PATH).await?;
        self.set_csrf_token(Some(response.csrf_token.clone()));
        tracing::debug!("csrf token refreshed");
        Ok(response.csrf_token)
    }

    /// Return the remembered CSRF token, fetching one if needed.
    pub async fn ensure_csrf_token(&self) -> Result<String, ClientError> {
        match self.csrf_token() {
            Some(token) => Ok(token),
            None => self.fetch_csrf_token().await,
        }
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode_json(response).await
    }

    /// `POST` a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.mutating(Method::POST, path).json(body)).await?;
        decode_json(response).await
    }

    /// `POST` a JSON body; only `expected` counts as success.
    ///
    /// Any other status, 2xx included, is an [`ClientError::Api`] error.
    pub async fn post_json_expecting<B, T>(
        &self,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.mutating(Method::POST, path).json(body)).await?;
        let status = response.status();
        if status != expected {
            tracing::warn!(
                path,
                status = status.as_u16(),
                expected = expected.as_u16(),
                "unexpected status"
            );
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: format!("unexpected status: {}", status.as_u16()),
            });
        }
        decode_json(response).await
    }

    /// `DELETE`, ignoring the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(self.mutating(Method::DELETE, path)).await?;
        Ok(())
    }

    /// `POST` a JSON body and ignore the response body.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.mutating(Method::POST, path).json(body)).await?;
        Ok(())
    }

    /// Raw `GET` returning only the status, for probes.
    pub async fn get_status(&self, path: &str) -> Result<StatusCode, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(response.status())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner.http.request(method, self.url(path))
    }

    fn mutating(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.request(method, path);
        match self.csrf_token() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }
        let detail = error_detail(response).await;
        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}

async fn decode_json<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Prefer the backend's `detail` field, fall back to the status line.
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let fallback = format!("HTTP error! status: {}", status.as_u16());
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}
