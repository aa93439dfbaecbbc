//! Shared test fixtures: a scriptable transport standing in for the remote
//! WordPress site.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use sitekeeper::client::RemoteManagerClient;
use sitekeeper::client::transport::{Transport, TransportError, WireRequest, WireResponse};
use sitekeeper::config::ClientConfig;

pub const TEST_SITE: &str = "https://client-site.example";
pub const TEST_KEY: &str = "test-api-key";

type Handler = dyn Fn(&WireRequest) -> Result<WireResponse, TransportError> + Send + Sync;

/// One dispatched call, recorded at the transport boundary.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(&'static str, String)>,
    pub at: tokio::time::Instant,
}

/// Transport whose behavior is a closure over the incoming request. Tests
/// capture shared state (versions, flags) in the closure to simulate a
/// remote site that changes as it is operated on.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&WireRequest) -> Result<WireResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: request.url.clone(),
            body: request.body.clone(),
            headers: request.headers.clone(),
            at: tokio::time::Instant::now(),
        });
        (self.handler)(&request)
    }
}

pub fn json_ok(value: serde_json::Value) -> Result<WireResponse, TransportError> {
    json_with_status(200, value)
}

pub fn json_with_status(
    status: u16,
    value: serde_json::Value,
) -> Result<WireResponse, TransportError> {
    Ok(WireResponse {
        status,
        body: value.to_string(),
    })
}

pub fn html_page(status: u16) -> Result<WireResponse, TransportError> {
    Ok(WireResponse {
        status,
        body: "<!DOCTYPE html><html><body>Service Unavailable</body></html>".to_string(),
    })
}

pub fn test_client(transport: Arc<MockTransport>) -> RemoteManagerClient {
    RemoteManagerClient::with_transport(TEST_SITE, TEST_KEY, ClientConfig::default(), transport)
}
