//! Wire models for the Remote Manager REST API.
//!
//! The remote plugin's response shapes vary between versions. List endpoints
//! return either a plain array or a `{success, <resource>: [...]}` wrapper;
//! `/updates` sometimes wraps its payload as `{success: true, updates: {...}}`
//! and sometimes returns the updates object directly. Models here carry
//! `#[serde(default)]` on nearly everything and the extraction helpers accept
//! every shape seen in the wild rather than failing on the unexpected.
//!
//! A typical `/plugins` item:
//!
//! ```json
//! {
//!   "plugin": "duplicate-post/duplicate-post.php",
//!   "name": "Duplicate Post",
//!   "slug": "duplicate-post",
//!   "version": "4.5",
//!   "active": true
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ClientError, ErrorKind, Result};

/// Installed plugin as reported by the `/plugins` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Canonical `directory/file.php` path.
    #[serde(default, alias = "plugin_path", alias = "file")]
    pub plugin: String,
    /// Alternate path field some plugin versions send instead of `plugin`.
    #[serde(default)]
    pub plugin_file: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active: bool,
}

/// Installed theme as reported by the `/themes` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeInfo {
    /// Theme directory name, the stable identifier WordPress uses.
    #[serde(default, alias = "theme")]
    pub stylesheet: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active: bool,
}

/// Site user from the `/users` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default, alias = "login", alias = "user_login")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One entry from the plugins section of the `/updates` payload. Used to
/// cross-reference display names against file paths during identifier
/// matching; the version fields are informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginUpdateRef {
    #[serde(default)]
    pub name: String,
    /// `directory/file.php` path, when the remote side includes it.
    #[serde(default, alias = "plugin_file", alias = "file")]
    pub plugin: Option<String>,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub new_version: Option<String>,
}

/// What kind of item an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Plugin,
    Theme,
    Core,
}

/// Caller-side selection of items to update, grouped per kind.
#[derive(Debug, Clone)]
pub struct UpdateSelection {
    pub kind: UpdateKind,
    pub items: Vec<String>,
}

impl UpdateSelection {
    pub fn single(kind: UpdateKind, identifier: &str) -> Self {
        Self {
            kind,
            items: vec![identifier.to_string()],
        }
    }
}

/// POST body for `/updates/perform`. Unset kinds stay empty/false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub plugins: Vec<String>,
    pub themes: Vec<String>,
    pub wordpress: bool,
}

impl UpdateRequest {
    pub fn from_selections(selections: &[UpdateSelection]) -> Self {
        let mut request = UpdateRequest::default();
        for selection in selections {
            match selection.kind {
                UpdateKind::Plugin => request.plugins.extend(selection.items.iter().cloned()),
                UpdateKind::Theme => request.themes.extend(selection.items.iter().cloned()),
                UpdateKind::Core => request.wordpress = true,
            }
        }
        request
    }
}

/// Structured result of [`validate_api_key`](crate::client::RemoteManagerClient::validate_api_key).
/// Never produced from a panic path; UI layers render `remediation` directly.
#[derive(Debug, Clone, Serialize)]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<&'static str>,
}

impl KeyValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            code: None,
            error: None,
            remediation: None,
        }
    }

    pub fn failed(err: &ClientError) -> Self {
        let kind = ErrorKind::classify(err);
        Self {
            valid: false,
            code: Some(kind),
            error: Some(err.to_string()),
            remediation: Some(kind.remediation()),
        }
    }
}

/// Unwrap the `/updates` payload variants.
///
/// `{success: true, updates: {...}}` yields the inner object; a bare object
/// with a recognizable shape (`count`/`plugins`/`themes`) passes through; any
/// other shape is returned untouched. Deliberately never an error.
pub fn unwrap_updates(raw: Value) -> Value {
    if let Value::Object(ref map) = raw {
        let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
        if success {
            if let Some(updates) = map.get("updates") {
                return updates.clone();
            }
        }
        if map.contains_key("count") || map.contains_key("plugins") || map.contains_key("themes") {
            return raw;
        }
    }
    raw
}

/// Extract a typed list from a list-endpoint payload.
///
/// Accepts a plain array, `{<key>: [...]}`, or `{success, <key>: [...]}`.
pub fn extract_list<T: DeserializeOwned>(raw: Value, key: &str) -> Result<Vec<T>> {
    let list = match raw {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(inner @ Value::Array(_)) => inner,
            _ => {
                return Err(ClientError::InvalidBody(format!(
                    "expected a list of {key} in the response"
                )));
            }
        },
        other => {
            return Err(ClientError::InvalidBody(format!(
                "expected a list of {key}, got {other}"
            )));
        }
    };

    serde_json::from_value(list).map_err(|e| ClientError::InvalidBody(e.to_string()))
}

/// Pull the WordPress core version out of a `/status` payload, tolerating
/// both flat and `{status: {...}}`-nested shapes.
pub fn core_version(status: &Value) -> Option<String> {
    let candidates = [&status["wordpress_version"], &status["wp_version"]];
    for candidate in candidates {
        if let Some(version) = candidate.as_str() {
            return Some(version.to_string());
        }
    }
    if let Some(nested) = status.get("status") {
        if nested.is_object() {
            return core_version(nested);
        }
    }
    None
}

/// Message carried by a perform-updates result that reports `success: false`,
/// if any. `None` means the run did not report failure.
pub fn run_failure(result: &Value) -> Option<String> {
    if result.get("success") == Some(&Value::Bool(false)) {
        let message = result
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Update failed");
        return Some(message.to_string());
    }
    None
}
