//! Per-item update protocol
//!
//! Driving one plugin/theme/core update to a definitive outcome is harder
//! than issuing the call: the remote update frequently outlives the request
//! timeout while WordPress finishes the work in the background. The
//! orchestrator compensates by snapshotting the installed version before the
//! update and re-checking it after a settle delay. When the update call times
//! out, it re-polls the site to decide whether the update silently completed
//! ([`UpdateOutcome::TimeoutRecovered`]) or is still in flight
//! ([`UpdateOutcome::TimeoutUnresolved`]).
//!
//! State machine: `Pending → {Success, Failed, TimeoutRecovered,
//! TimeoutUnresolved}`. `Pending` is the only non-terminal state.
//!
//! The orchestrator has no persistence side effects; it returns a finalized
//! [`UpdateAttempt`] and leaves logging/notification to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::RemoteManagerClient;
use crate::client::error::ClientError;
use crate::client::matching::{locate_plugin, locate_theme};
use crate::client::models::{
    PluginUpdateRef, UpdateKind, UpdateSelection, core_version, run_failure,
};

/// Version string recorded when an inventory lookup misses. A missing
/// snapshot is not an error by itself.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Terminal (and initial) states of one update attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum UpdateOutcome {
    Pending,
    Success,
    Failed { message: String },
    /// The update call timed out, but verification showed the version
    /// changed: the update completed in the background.
    TimeoutRecovered,
    /// The update call timed out and the version has not changed yet. The
    /// operation may still be running remotely; surfaced as "still
    /// processing", not as a failure.
    TimeoutUnresolved,
}

impl UpdateOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UpdateOutcome::Pending)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Pending => write!(f, "update pending"),
            UpdateOutcome::Success => write!(f, "update completed"),
            UpdateOutcome::Failed { message } => write!(f, "update failed: {message}"),
            UpdateOutcome::TimeoutRecovered => {
                write!(f, "update completed after a timeout (recovered by verification)")
            }
            UpdateOutcome::TimeoutUnresolved => {
                write!(
                    f,
                    "update still processing on the remote site, check back later"
                )
            }
        }
    }
}

/// Record of a single update attempt, owned by the call that created it.
/// Serializable so callers can persist it once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAttempt {
    pub id: Uuid,
    pub kind: UpdateKind,
    pub item: String,
    pub old_version: String,
    pub new_version: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub outcome: UpdateOutcome,
}

impl UpdateAttempt {
    fn begin(kind: UpdateKind, item: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            item: item.to_string(),
            old_version: UNKNOWN_VERSION.to_string(),
            new_version: UNKNOWN_VERSION.to_string(),
            started_at: Utc::now(),
            duration_secs: 0,
            outcome: UpdateOutcome::Pending,
        }
    }
}

/// Drives single-item updates through the protocol above.
///
/// No mutual exclusion is provided for concurrent attempts on the same
/// (site, item) pair; callers that can run updates concurrently must add
/// their own lock keyed by site and item identifier.
pub struct UpdateOrchestrator<'a> {
    client: &'a RemoteManagerClient,
    settle_delay: Duration,
    verify_delay: Duration,
    stall_threshold: Duration,
}

impl<'a> UpdateOrchestrator<'a> {
    pub fn new(client: &'a RemoteManagerClient) -> Self {
        let config = client.config();
        Self {
            client,
            settle_delay: config.settle_delay(),
            verify_delay: config.verify_delay(),
            stall_threshold: config.stall_threshold(),
        }
    }

    /// Update one plugin, theme, or WordPress core to a definitive outcome.
    pub async fn update_item(&self, kind: UpdateKind, identifier: &str) -> UpdateAttempt {
        let started = tokio::time::Instant::now();
        let mut attempt = UpdateAttempt::begin(kind, identifier);

        info!(item = identifier, kind = ?kind, "Starting update");

        // The updates listing maps display names to file paths; fetched once
        // and reused by every lookup in this attempt. A failure here only
        // disables the cross-reference matching rule.
        let update_refs = self.plugin_update_refs(kind).await;

        if let Some(version) = self
            .lookup_version_lenient(kind, identifier, &update_refs)
            .await
        {
            attempt.old_version = version;
        }

        match self.run_update(kind, identifier, &update_refs).await {
            Ok(observed) => {
                attempt.new_version = observed.unwrap_or_else(|| attempt.old_version.clone());
                attempt.outcome = UpdateOutcome::Success;
                info!(
                    item = identifier,
                    old = %attempt.old_version,
                    new = %attempt.new_version,
                    "Update completed"
                );
            }
            Err(err) => {
                let elapsed = started.elapsed();
                if is_timeout(&err, elapsed, self.stall_threshold) {
                    warn!(
                        item = identifier,
                        error = %err,
                        elapsed_secs = elapsed.as_secs(),
                        "Update timed out, verifying remote state"
                    );
                    tokio::time::sleep(self.verify_delay).await;

                    match self
                        .verify_update(kind, identifier, &attempt.old_version, &update_refs)
                        .await
                    {
                        Some(new_version) => {
                            attempt.new_version = new_version;
                            attempt.outcome = UpdateOutcome::TimeoutRecovered;
                            self.client.metrics().timeout_recovered();
                            info!(
                                item = identifier,
                                new = %attempt.new_version,
                                "Update completed in the background despite timeout"
                            );
                        }
                        None => {
                            attempt.new_version = attempt.old_version.clone();
                            attempt.outcome = UpdateOutcome::TimeoutUnresolved;
                            info!(
                                item = identifier,
                                "Update unconfirmed, may still be processing remotely"
                            );
                        }
                    }
                } else {
                    warn!(item = identifier, error = %err, "Update failed");
                    attempt.outcome = UpdateOutcome::Failed {
                        message: err.to_string(),
                    };
                }
            }
        }

        attempt.duration_secs = started.elapsed().as_secs();
        attempt
    }

    /// Re-poll the remote inventory after a timeout and compare against the
    /// version observed before the update. A changed version means the update
    /// silently succeeded; returns the newly observed version in that case.
    pub async fn verify_update(
        &self,
        kind: UpdateKind,
        identifier: &str,
        expected_old: &str,
        update_refs: &[PluginUpdateRef],
    ) -> Option<String> {
        match self
            .lookup_version_lenient(kind, identifier, update_refs)
            .await
        {
            Some(current) if current != expected_old => Some(current),
            _ => None,
        }
    }

    /// Perform the update call, settle, and re-read the installed version.
    /// `Ok(None)` means the post-update lookup missed the item.
    async fn run_update(
        &self,
        kind: UpdateKind,
        identifier: &str,
        update_refs: &[PluginUpdateRef],
    ) -> Result<Option<String>, ClientError> {
        let selection = UpdateSelection::single(kind, identifier);
        let result = self.client.perform_updates(&[selection]).await?;

        if let Some(message) = run_failure(&result) {
            return Err(ClientError::RemoteOperation(message));
        }

        // Give the site a moment to finish applying the change before
        // trusting the inventory again.
        tokio::time::sleep(self.settle_delay).await;

        self.lookup_version(kind, identifier, update_refs).await
    }

    /// Installed version of the item, or `Ok(None)` when no inventory entry
    /// matches the identifier.
    async fn lookup_version(
        &self,
        kind: UpdateKind,
        identifier: &str,
        update_refs: &[PluginUpdateRef],
    ) -> Result<Option<String>, ClientError> {
        match kind {
            UpdateKind::Plugin => {
                let inventory = self.client.plugins().await?;
                Ok(locate_plugin(identifier, &inventory, update_refs)
                    .map(|p| p.version.clone()))
            }
            UpdateKind::Theme => {
                let inventory = self.client.themes().await?;
                Ok(locate_theme(identifier, &inventory).map(|t| t.version.clone()))
            }
            UpdateKind::Core => {
                let status = self.client.status().await?;
                Ok(core_version(&status))
            }
        }
    }

    /// Lookup that swallows errors: snapshot misses must never fail the
    /// surrounding operation.
    async fn lookup_version_lenient(
        &self,
        kind: UpdateKind,
        identifier: &str,
        update_refs: &[PluginUpdateRef],
    ) -> Option<String> {
        match self.lookup_version(kind, identifier, update_refs).await {
            Ok(version) => version,
            Err(err) => {
                debug!(item = identifier, error = %err, "Version lookup failed");
                None
            }
        }
    }

    async fn plugin_update_refs(&self, kind: UpdateKind) -> Vec<PluginUpdateRef> {
        if kind != UpdateKind::Plugin {
            return Vec::new();
        }
        match self.client.updates().await {
            Ok(payload) => parse_update_refs(&payload),
            Err(err) => {
                debug!(error = %err, "Updates listing unavailable for cross-reference");
                Vec::new()
            }
        }
    }
}

fn parse_update_refs(payload: &Value) -> Vec<PluginUpdateRef> {
    payload
        .get("plugins")
        .cloned()
        .and_then(|plugins| serde_json::from_value(plugins).ok())
        .unwrap_or_default()
}

/// A failure counts as a timeout when it carries a recognizable timeout
/// message or code, or when the whole attempt ran long enough that a
/// client-side timeout must have fired without surfacing one.
fn is_timeout(err: &ClientError, elapsed: Duration, stall_threshold: Duration) -> bool {
    if matches!(err, ClientError::Timeout(_)) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    message.contains("timeout")
        || message.contains("etimedout")
        || message.contains("econnaborted")
        || elapsed >= stall_threshold
}
