//! HTTP transport seam for the Remote Manager client
//!
//! The client talks to the wire through the [`Transport`] trait so tests can
//! script remote behavior without a network. The production implementation is
//! a thin reqwest wrapper with per-request timeouts.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Cannot connect to site: {0}")]
    Connect(String),

    #[error("Request timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A single outgoing call, fully resolved (URL, headers, body, timeout).
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

/// Raw response: status plus unparsed body text.
///
/// The body stays a string here on purpose. The remote side sometimes sends
/// HTML error pages with a 200 status, so content classification belongs to
/// the client, not the transport.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse>;
}

/// Production transport over reqwest
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("SiteKeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse> {
        debug!(url = %request.url, method = ?request.method, "Dispatching request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };

        builder = builder.timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(format!("Failed to read body: {}", e)))?;

        debug!(url = %request.url, status, size = body.len(), "Response received");

        Ok(WireResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_timeout() {
        let err = TransportError::Timeout(Duration::from_secs(15));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_connect_message_is_classifiable() {
        let err = TransportError::Connect("dns failure".to_string());
        assert!(err.to_string().contains("Cannot connect"));
    }
}
