//! Typed HTTP clients for the STACKIT APIs.
//!
//! [`ApiClient`] carries the base URL and the bearer token of one API and
//! turns non-success responses into [`ProviderError::Api`]. The per-service
//! modules wrap it with the endpoints and payload types of that service.

pub mod logme;
pub mod logs;
pub mod observability;
pub mod scf;
pub mod serverupdate;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{ProviderError, Result};

/// An authenticated client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url` using a shared HTTP transport.
    pub fn new(http: Client, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(&self.token)
    }

    /// `GET` a JSON document.
    pub async fn get<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        let response = self.send(operation, self.request(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    /// `POST` a JSON body and decode the JSON answer.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(operation, self.request(Method::POST, path).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// `POST` without a body, ignoring the answer.
    pub async fn post_empty(&self, operation: &str, path: &str) -> Result<()> {
        self.send(operation, self.request(Method::POST, path)).await?;
        Ok(())
    }

    /// `PUT` a JSON body and decode the JSON answer.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(operation, self.request(Method::PUT, path).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// `PUT` a JSON body, ignoring the answer.
    pub async fn put_discard<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<()> {
        self.send(operation, self.request(Method::PUT, path).json(body))
            .await?;
        Ok(())
    }

    /// `PATCH` a JSON body, ignoring the answer.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<()> {
        self.send(operation, self.request(Method::PATCH, path).json(body))
            .await?;
        Ok(())
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, operation: &str, path: &str) -> Result<()> {
        self.send(operation, self.request(Method::DELETE, path))
            .await?;
        Ok(())
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), url = %response.url(), "API call");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        trace!(operation, body = %body, "API error body");
        Err(ProviderError::api(operation, status, error_message(&body)))
    }
}

/// Pull a readable message out of an API error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error", "msg"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Turn a 404 into `Ok(None)`, passing every other outcome through.
pub fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
