//! Remote Manager client
//!
//! [`RemoteManagerClient`] encapsulates every call to a managed WordPress
//! site's control-plane REST API, which is mounted under `/wp-json/` by a
//! companion plugin of unknown version. The resilience contract lives in the
//! `request` primitive:
//!
//! - a minimum inter-request spacing enforced per client instance,
//! - an ordered namespace fallback (current plugin versions mount
//!   [`PRIMARY_NAMESPACE`], older ones only [`LEGACY_NAMESPACE`]),
//! - soft-failure detection: WordPress returns `{"code": "rest_no_route"}`
//!   with HTTP 200 when a route is missing, and intermediaries (WAFs,
//!   maintenance pages, PHP fatals) return HTML documents with success
//!   status codes. Both must be treated as failures by content inspection.
//!
//! Each attempt gets exactly one fallback; there is no backoff and no
//! multi-retry. Persisting results and notifying users is the caller's job.

pub mod error;
pub mod matching;
pub mod models;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::observability::Metrics;
use error::{ClientError, Result};
use models::{
    KeyValidation, PluginInfo, SiteUser, ThemeInfo, UpdateRequest, UpdateSelection, extract_list,
    unwrap_updates,
};
use transport::{HttpTransport, Method, Transport, WireRequest, WireResponse};

/// REST namespace mounted by current Remote Manager plugin versions.
pub const PRIMARY_NAMESPACE: &str = "wp-remote-manager/v1";
/// REST namespace mounted by older plugin versions. Supported indefinitely.
pub const LEGACY_NAMESPACE: &str = "wrm/v1";

/// Every header name the key has historically been read from. All of them are
/// sent on every call because the remote plugin version is unknown.
pub const API_KEY_HEADERS: [&str; 3] = ["X-WRM-API-Key", "X-WRMS-API-Key", "X-API-Key"];

const NAMESPACES: [&str; 2] = [PRIMARY_NAMESPACE, LEGACY_NAMESPACE];

/// Client for one managed site's Remote Manager API.
///
/// The only shared mutable state is the rate-limit timestamp; a client may be
/// shared across tasks, which then serialize at the dispatch gate. One
/// instance per site keeps rate limits from cross-contaminating.
pub struct RemoteManagerClient {
    base_url: String,
    api_key: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    last_request: Mutex<Option<Instant>>,
    metrics: Metrics,
}

impl RemoteManagerClient {
    /// Create a client over the production HTTP transport.
    pub fn new(base_url: &str, api_key: &str, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.connect_timeout())
            .map_err(ClientError::from)?;
        Ok(Self::with_transport(
            base_url,
            api_key,
            config,
            Arc::new(transport),
        ))
    }

    /// Create a client over an arbitrary transport. This is the seam tests
    /// use to script remote behavior.
    pub fn with_transport(
        base_url: &str,
        api_key: &str,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config,
            transport,
            last_request: Mutex::new(None),
            metrics: Metrics::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Site status (versions, environment info).
    pub async fn status(&self) -> Result<Value> {
        self.request("/status", Method::Get, None).await
    }

    /// Site health report.
    pub async fn health(&self) -> Result<Value> {
        self.request("/health", Method::Get, None).await
    }

    /// Pending updates, unwrapped from the envelope variants the remote side
    /// produces. Unexpected shapes pass through untouched rather than erroring.
    pub async fn updates(&self) -> Result<Value> {
        let raw = self.request("/updates", Method::Get, None).await?;
        Ok(unwrap_updates(raw))
    }

    /// Installed plugins.
    pub async fn plugins(&self) -> Result<Vec<PluginInfo>> {
        let raw = self.request("/plugins", Method::Get, None).await?;
        extract_list(raw, "plugins")
    }

    /// Installed themes.
    pub async fn themes(&self) -> Result<Vec<ThemeInfo>> {
        let raw = self.request("/themes", Method::Get, None).await?;
        extract_list(raw, "themes")
    }

    /// Site users.
    pub async fn users(&self) -> Result<Vec<SiteUser>> {
        let raw = self.request("/users", Method::Get, None).await?;
        extract_list(raw, "users")
    }

    pub async fn activate_plugin(&self, plugin: &str) -> Result<Value> {
        self.request("/plugins/activate", Method::Post, Some(json!({ "plugin": plugin })))
            .await
    }

    pub async fn deactivate_plugin(&self, plugin: &str) -> Result<Value> {
        self.request(
            "/plugins/deactivate",
            Method::Post,
            Some(json!({ "plugin": plugin })),
        )
        .await
    }

    pub async fn delete_plugin(&self, plugin: &str) -> Result<Value> {
        self.request("/plugins/delete", Method::Post, Some(json!({ "plugin": plugin })))
            .await
    }

    pub async fn activate_theme(&self, theme: &str) -> Result<Value> {
        self.request("/themes/activate", Method::Post, Some(json!({ "theme": theme })))
            .await
    }

    pub async fn delete_theme(&self, theme: &str) -> Result<Value> {
        self.request("/themes/delete", Method::Post, Some(json!({ "theme": theme })))
            .await
    }

    /// Kick off updates for the selected items. The merged payload carries up
    /// to three fields (`plugins`, `themes`, `wordpress`); unset kinds stay
    /// empty/false. Returns the remote run result as-is; callers inspect the
    /// `success` field via [`models::run_failure`].
    pub async fn perform_updates(&self, selections: &[UpdateSelection]) -> Result<Value> {
        let request = UpdateRequest::from_selections(selections);
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::InvalidBody(e.to_string()))?;
        self.request("/updates/perform", Method::Post, Some(body))
            .await
    }

    /// Probe the API key by fetching status. Never fails: any error is
    /// classified into a structured result UI layers render directly.
    pub async fn validate_api_key(&self) -> KeyValidation {
        match self.status().await {
            Ok(_) => KeyValidation::ok(),
            Err(err) => {
                warn!(site = %self.base_url, error = %err, "API key validation failed");
                KeyValidation::failed(&err)
            }
        }
    }

    /// Core request primitive: rate limit, then try each namespace in order.
    ///
    /// On a double failure the surfaced error prefers "plugin missing" when
    /// the legacy attempt reported the route absent; otherwise the legacy
    /// error propagates as-is.
    async fn request(&self, endpoint: &str, method: Method, body: Option<Value>) -> Result<Value> {
        let timeout = if endpoint == "/updates/perform" {
            self.config.update_timeout()
        } else {
            self.config.request_timeout()
        };

        let mut last_error: Option<ClientError> = None;

        for namespace in NAMESPACES {
            let url = format!("{}/wp-json/{}{}", self.base_url, namespace, endpoint);
            if last_error.is_some() {
                self.metrics.fallback_taken();
                debug!(endpoint, namespace, "Falling back to legacy namespace");
            }

            match self.attempt(&url, method, body.clone(), timeout).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if matches!(
                        err,
                        ClientError::RouteNotFound(_) | ClientError::HtmlErrorPage(_)
                    ) {
                        self.metrics.soft_failure();
                    }
                    warn!(endpoint, namespace, error = %err, "Request attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(match last_error {
            Some(ClientError::RouteNotFound(_)) => ClientError::PluginMissing,
            Some(err) => err,
            // NAMESPACES is non-empty, so the loop always records an error
            None => ClientError::RemoteOperation("no namespace attempted".to_string()),
        })
    }

    /// One outgoing call: throttle, dispatch, classify the response body.
    async fn attempt(
        &self,
        url: &str,
        method: Method,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.throttle().await;

        let mut headers: Vec<(&'static str, String)> =
            vec![("Content-Type", "application/json".to_string())];
        for name in API_KEY_HEADERS {
            headers.push((name, self.api_key.clone()));
        }

        let response = self
            .transport
            .execute(WireRequest {
                method,
                url: url.to_string(),
                headers,
                body,
                timeout,
            })
            .await?;

        self.metrics.request_sent();
        classify_response(response)
    }

    /// Enforce the minimum spacing between outgoing requests. The lock is
    /// held across the sleep so concurrent callers sharing this instance
    /// serialize at the dispatch gate.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let interval = self.config.rate_limit_interval();
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Classify a raw response into a payload or a failure.
///
/// Content checks run before status checks: a `rest_no_route` envelope can
/// arrive under any status and must be recognized ahead of a generic 404, and
/// HTML bodies are failures regardless of status code.
fn classify_response(response: WireResponse) -> Result<Value> {
    let WireResponse { status, body } = response;

    match serde_json::from_str::<Value>(&body) {
        Ok(value) => {
            if value.get("code").and_then(Value::as_str) == Some("rest_no_route") {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no matching route")
                    .to_string();
                return Err(ClientError::RouteNotFound(message));
            }

            // A JSON string body can still be an HTML page, e.g. when a
            // middlebox wraps its error output in quotes.
            if let Some(text) = value.as_str() {
                if looks_like_html(text) {
                    return Err(ClientError::HtmlErrorPage(status));
                }
            }

            if status >= 400 {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("request rejected with HTTP {status}"));
                return Err(ClientError::Status { status, message });
            }

            Ok(value)
        }
        Err(parse_err) => {
            if looks_like_html(&body) {
                return Err(ClientError::HtmlErrorPage(status));
            }
            if status >= 400 {
                return Err(ClientError::Status {
                    status,
                    message: format!("request rejected with HTTP {status}"),
                });
            }
            Err(ClientError::InvalidBody(parse_err.to_string()))
        }
    }
}

fn looks_like_html(body: &str) -> bool {
    body.contains("<!DOCTYPE") || body.contains("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> WireResponse {
        WireResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_classify_ok_payload() {
        let value = classify_response(response(200, r#"{"wordpress_version": "6.5"}"#)).unwrap();
        assert_eq!(value["wordpress_version"], "6.5");
    }

    #[test]
    fn test_classify_rest_no_route_with_200() {
        // WordPress reports missing routes with a success status; the status
        // code alone says nothing.
        let err = classify_response(response(
            200,
            r#"{"code": "rest_no_route", "message": "No route was found"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ClientError::RouteNotFound(_)));
    }

    #[test]
    fn test_classify_html_page_any_status() {
        for status in [200, 404, 503] {
            let err =
                classify_response(response(status, "<!DOCTYPE html><html>oops</html>"))
                    .unwrap_err();
            assert!(matches!(err, ClientError::HtmlErrorPage(s) if s == status));
        }
    }

    #[test]
    fn test_classify_quoted_html_string_body() {
        let err = classify_response(response(200, r#""<html><body>blocked</body></html>""#))
            .unwrap_err();
        assert!(matches!(err, ClientError::HtmlErrorPage(200)));
    }

    #[test]
    fn test_classify_4xx_carries_remote_message() {
        let err = classify_response(response(
            401,
            r#"{"message": "Invalid or incorrect API key"}"#,
        ))
        .unwrap_err();
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("API key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_5xx_is_failure() {
        let err = classify_response(response(500, r#"{"message": "boom"}"#)).unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_classify_garbage_body() {
        let err = classify_response(response(200, "not json at all")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidBody(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = RemoteManagerClient::with_transport(
            "https://example.com/",
            "key",
            ClientConfig::default(),
            Arc::new(NullTransport),
        );
        assert_eq!(client.base_url(), "https://example.com");
    }

    struct NullTransport;

    #[async_trait::async_trait]
    impl Transport for NullTransport {
        async fn execute(
            &self,
            _request: WireRequest,
        ) -> std::result::Result<WireResponse, transport::TransportError> {
            Err(transport::TransportError::Connect("null".to_string()))
        }
    }
}
