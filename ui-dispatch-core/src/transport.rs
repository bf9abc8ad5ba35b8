//! Remote-call seam
//!
//! The dispatcher never talks to the network directly. It builds an
//! [`ApiRequest`] and hands it to a [`Transport`]; [`HttpTransport`] is the
//! reqwest-backed implementation, and `testing::MockTransport` scripts
//! responses for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::node::HttpMethod;
use crate::value::Value;

/// A fully resolved remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

/// Performs remote calls and decodes JSON responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the decoded JSON payload.
    ///
    /// Responses outside the 2xx range are errors.
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        // `json` only sets the content type when no header provided one.
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
