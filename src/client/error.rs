//! Error types and failure classification for the Remote Manager client
//!
//! The remote side reports failures inconsistently: real transport errors,
//! HTTP status codes, WordPress `rest_no_route` envelopes delivered with a
//! 200, and whole HTML error pages. [`ClientError`] is the closed set of
//! causes the rest of the crate pattern-matches on, and [`ErrorKind`] maps
//! any of them to a user-facing code with a fixed remediation sentence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot connect to site: {0}")]
    Connection(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// WordPress answered with a `rest_no_route` envelope. The status code is
    /// often 200, so this is detected by content inspection.
    #[error("REST route not found (rest_no_route): {0}")]
    RouteNotFound(String),

    /// The body was an HTML document instead of JSON. Typically a CDN/WAF
    /// block, a maintenance page, or a PHP fatal error rendered as HTML.
    #[error("Remote site returned an HTML error page instead of JSON (HTTP {0})")]
    HtmlErrorPage(u16),

    /// Both namespaces reported the route missing.
    #[error(
        "WP Remote Manager plugin endpoints not found; the plugin is not installed or activated on the remote site"
    )]
    PluginMissing,

    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// HTTP status carried by this error, when one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::HtmlErrorPage(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Connect(msg) => ClientError::Connection(msg),
            TransportError::Timeout(duration) => ClientError::Timeout(duration.as_secs()),
            TransportError::Request(msg) => ClientError::RemoteOperation(msg),
        }
    }
}

/// Closed classification set for key-validation failures.
///
/// Matching is a mix of structural checks on [`ClientError`] variants and
/// substring checks on the rendered message, applied in priority order with
/// the first hit winning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidApiKey,
    InsufficientPermissions,
    PluginNotInstalled,
    ConnectionFailed,
    Timeout,
    HtmlErrorResponse,
    UnknownError,
}

impl ErrorKind {
    pub fn classify(err: &ClientError) -> Self {
        let message = err.to_string();
        let lowered = message.to_lowercase();
        let status = err.status();

        if status == Some(401)
            || (message.contains("Invalid or incorrect") && message.contains("API key"))
        {
            return ErrorKind::InvalidApiKey;
        }

        if status == Some(403) || message.contains("Access denied") {
            return ErrorKind::InsufficientPermissions;
        }

        if matches!(err, ClientError::PluginMissing | ClientError::RouteNotFound(_))
            || message.contains("plugin endpoints not found")
            || message.contains("rest_no_route")
            || status == Some(404)
        {
            return ErrorKind::PluginNotInstalled;
        }

        if matches!(err, ClientError::Connection(_)) || message.contains("Cannot connect") {
            return ErrorKind::ConnectionFailed;
        }

        if matches!(err, ClientError::Timeout(_))
            || lowered.contains("timeout")
            || lowered.contains("etimedout")
        {
            return ErrorKind::Timeout;
        }

        if matches!(err, ClientError::HtmlErrorPage(_))
            || message.contains("<!DOCTYPE")
            || message.contains("<html")
        {
            return ErrorKind::HtmlErrorResponse;
        }

        ErrorKind::UnknownError
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => "INVALID_API_KEY",
            ErrorKind::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorKind::PluginNotInstalled => "PLUGIN_NOT_INSTALLED",
            ErrorKind::ConnectionFailed => "CONNECTION_FAILED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::HtmlErrorResponse => "HTML_ERROR_RESPONSE",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Fixed remediation sentence shown to agency users.
    pub fn remediation(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => {
                "Check the API key in the WP Remote Manager settings on the remote site and update it here."
            }
            ErrorKind::InsufficientPermissions => {
                "The API key is valid but lacks permission; regenerate it with an administrator account."
            }
            ErrorKind::PluginNotInstalled => {
                "Install and activate the latest WP Remote Manager plugin version on the remote site."
            }
            ErrorKind::ConnectionFailed => {
                "Verify the site URL is correct and the site is reachable."
            }
            ErrorKind::Timeout => {
                "The site took too long to respond; try again or check the site's hosting performance."
            }
            ErrorKind::HtmlErrorResponse => {
                "The site returned an error page instead of an API response; check for maintenance mode or a security plugin blocking requests."
            }
            ErrorKind::UnknownError => {
                "An unexpected error occurred; check the site and the Remote Manager plugin logs."
            }
        }
    }
}
