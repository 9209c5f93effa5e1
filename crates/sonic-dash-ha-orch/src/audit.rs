//! Structured audit trail for DASH HA orchestration.
//!
//! Every action that reaches the SAI DASH HA API (pair and session
//! create/remove, role changes, counter clears) and every observed HA scope
//! state change produces one [`AuditRecord`]. Records are emitted through
//! [`audit_log!`] on the `audit` tracing target with the full record
//! serialized as JSON in the `audit_json` field, so a collector can filter
//! on the target and parse the payload without knowing the message format.
//!
//! | Outcome | Level |
//! |---------|-------|
//! | success | info |
//! | in progress | debug |
//! | failure / denied | warn |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sonic_sai_dash_ha::SaiStatus;
use std::fmt;

/// What kind of action an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// HA pair or HA session created.
    ResourceCreate,
    /// Settable attribute changed on an existing object.
    ResourceModify,
    /// HA pair or HA session removed.
    ResourceDelete,
    /// HA scope state reported by the data plane.
    HaStateChange,
    /// Counter reads that clear, and other direct SAI calls.
    SaiOperation,
    /// Configuration loaded or rejected.
    ConfigurationChange,
    /// Daemon start and stop.
    SystemLifecycle,
    /// Failures with no owning object.
    ErrorCondition,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditCategory::ResourceCreate => "RESOURCE_CREATE",
            AuditCategory::ResourceModify => "RESOURCE_MODIFY",
            AuditCategory::ResourceDelete => "RESOURCE_DELETE",
            AuditCategory::HaStateChange => "HA_STATE_CHANGE",
            AuditCategory::SaiOperation => "SAI_OPERATION",
            AuditCategory::ConfigurationChange => "CONFIGURATION_CHANGE",
            AuditCategory::SystemLifecycle => "SYSTEM_LIFECYCLE",
            AuditCategory::ErrorCondition => "ERROR_CONDITION",
        };
        f.write_str(s)
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    /// Accepted but deferred until a dependency appears.
    InProgress,
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::InProgress => "in_progress",
            AuditOutcome::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// One audit event.
///
/// Built with the `with_*` methods and handed to [`audit_log!`]. The
/// timestamp is taken at construction, in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    /// Component that produced the record, e.g. `DashHaOrch`.
    pub source: String,
    pub action: String,
    pub outcome: AuditOutcome,
    /// Table key or SAI oid of the affected object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// `dash_ha_pair`, `dash_ha_session`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// SAI status name when the action went through the adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sai_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Starts a record in the `InProgress` state.
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            sai_status: None,
            details: None,
            error: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    /// Records the SAI status of the call. A non-success status also marks
    /// the record as failed.
    pub fn with_sai_status(mut self, status: SaiStatus) -> Self {
        if !status.is_success() {
            self.outcome = AuditOutcome::Failure;
        }
        self.sai_status = Some(status.to_string());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the error message and marks the record as failed.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    /// Serializes the record. Never fails; a serialization error is itself
    /// reported as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Emits an [`AuditRecord`] on the `audit` target at the level its outcome
/// maps to.
///
/// ```ignore
/// audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "DashHaOrch", "create_ha_pair")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id("pair0")
///     .with_object_type("dash_ha_pair"));
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure | $crate::audit::AuditOutcome::Denied => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

/// Installs the global subscriber with JSON output.
///
/// `RUST_LOG` wins over `log_level` when set. Records from the `log` facade
/// (the SAI bindings log through it) are forwarded into the same subscriber.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .init();
}

/// Installs the global subscriber with human-readable output.
pub fn init_logging_pretty(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_builder() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "DashHaOrch", "create_ha_pair")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("pair0")
            .with_object_type("dash_ha_pair");

        assert_eq!(record.category, AuditCategory::ResourceCreate);
        assert_eq!(record.source, "DashHaOrch");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id.as_deref(), Some("pair0"));
        assert_eq!(record.object_type.as_deref(), Some("dash_ha_pair"));
        assert!(record.sai_status.is_none());
    }

    #[test]
    fn test_error_marks_failure() {
        let record = AuditRecord::new(AuditCategory::ResourceDelete, "DashHaOrch", "remove_ha_pair")
            .with_outcome(AuditOutcome::Success)
            .with_error("pair still referenced");
        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error.as_deref(), Some("pair still referenced"));
    }

    #[test]
    fn test_sai_status() {
        let ok = AuditRecord::new(AuditCategory::SaiOperation, "DashHaOrch", "clear")
            .with_outcome(AuditOutcome::Success)
            .with_sai_status(SaiStatus::Success);
        assert_eq!(ok.outcome, AuditOutcome::Success);

        let failed = AuditRecord::new(AuditCategory::SaiOperation, "DashHaOrch", "clear")
            .with_outcome(AuditOutcome::Success)
            .with_sai_status(SaiStatus::ObjectInUse);
        assert_eq!(failed.outcome, AuditOutcome::Failure);
        assert_eq!(failed.sai_status, Some(SaiStatus::ObjectInUse.to_string()));
    }

    #[test]
    fn test_json_shape() {
        let record = AuditRecord::new(AuditCategory::HaStateChange, "DashHaOrch", "ha_scope_event")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({ "ha_role": "active" }));
        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();

        assert_eq!(value["category"], "HA_STATE_CHANGE");
        assert_eq!(value["outcome"], "success");
        assert_eq!(value["details"]["ha_role"], "active");
        assert!(value.get("object_id").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(AuditCategory::HaStateChange.to_string(), "HA_STATE_CHANGE");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
    }
}
