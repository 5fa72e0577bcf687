//! HTTP collaborator: sends a [`RequestDescriptor`] and parses the reply.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DqmConfig;
use crate::error::{Error, Result};

use super::builder::RequestDescriptor;
use super::operation::HttpMethod;

/// Executes one request and returns the parsed JSON body.
///
/// Non-success statuses surface as [`Error::Api`] with the body untouched.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value>;
}

/// reqwest-backed transport sharing one connection pool across items.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &DqmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout defaults: {}", e);
                Client::new()
            });
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(&DqmConfig::default())
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let start = Instant::now();
        // reqwest errors embed the URL, which carries the API key
        let response = builder.send().await.map_err(|e| Error::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        debug!(
            method = %request.method,
            url = %request.redacted_url(),
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "DQM request completed"
        );

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_body(&body)
    }
}

/// An empty success body (e.g. `204 No Content`) becomes `null`.
pub(crate) fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))
}
