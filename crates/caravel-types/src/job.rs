//! Import job model types.
//!
//! A [`Job`] is created by the product API before a run starts and is
//! read-only to the engine apart from status transitions. Identifier
//! newtypes keep the id spaces from being mixed up at call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

id_newtype!(
    /// Opaque import job identifier.
    JobId
);
id_newtype!(
    /// Opaque import report identifier.
    ReportId
);
id_newtype!(
    /// Opaque destination workspace identifier.
    WorkspaceId
);
id_newtype!(
    /// Opaque destination project identifier.
    ProjectId
);
id_newtype!(
    /// Reference to a credential bundle in the external credential store,
    /// keyed by (workspace, connector, user). The engine never sees token
    /// material, only this handle.
    CredentialRef
);

// ---------------------------------------------------------------------------
// Connectors
// ---------------------------------------------------------------------------

/// Third-party system a job imports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Jira,
    Asana,
    Gitlab,
    Notion,
    Clickup,
    Linear,
    Slack,
    Csv,
}

impl SourceKind {
    /// Wire-format connector id.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Asana => "asana",
            Self::Gitlab => "gitlab",
            Self::Notion => "notion",
            Self::Clickup => "clickup",
            Self::Linear => "linear",
            Self::Slack => "slack",
            Self::Csv => "csv",
        }
    }

    /// All connectors the engine knows about, in registry order.
    #[must_use]
    pub fn all() -> &'static [SourceKind] {
        &[
            Self::Jira,
            Self::Asana,
            Self::Gitlab,
            Self::Notion,
            Self::Clickup,
            Self::Linear,
            Self::Slack,
            Self::Csv,
        ]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Lifecycle status of an import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Pulling,
    Processing,
    Completed,
    Errored,
    Cancelled,
}

impl JobStatus {
    /// Wire-format string for storage and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pulling => "pulling",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the job has reached a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One import job, owned by the product API.
///
/// Steps treat this as read-only; the engine itself only transitions
/// `status` through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub report_id: ReportId,
    pub workspace_id: WorkspaceId,
    pub project_id: ProjectId,
    pub source: SourceKind,
    /// Connector-specific source configuration (project key, resource id,
    /// field mappings). Opaque to the engine.
    pub config: serde_json::Value,
    pub credential: CredentialRef,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Set by the product API when a user cancels the job mid-run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether the job was cancelled externally.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some() || self.status == JobStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            id: JobId::new("job-1"),
            report_id: ReportId::new("report-1"),
            workspace_id: WorkspaceId::new("ws-1"),
            project_id: ProjectId::new("proj-1"),
            source: SourceKind::Jira,
            config: serde_json::json!({"project_key": "ENG"}),
            credential: CredentialRef::new("cred-1"),
            status: JobStatus::Created,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    #[test]
    fn job_id_display_and_as_str() {
        let id = JobId::new("job-42");
        assert_eq!(id.as_str(), "job-42");
        assert_eq!(id.to_string(), "job-42");
    }

    #[test]
    fn job_id_serde_transparent() {
        let id = JobId::new("job-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"job-42\"");
    }

    #[test]
    fn source_kind_wire_format() {
        assert_eq!(SourceKind::Jira.as_str(), "jira");
        assert_eq!(SourceKind::Clickup.as_str(), "clickup");
        let json = serde_json::to_string(&SourceKind::Csv).unwrap();
        assert_eq!(json, "\"csv\"");
    }

    #[test]
    fn job_status_terminality() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Errored.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pulling.is_terminal());
        assert!(!JobStatus::Created.is_terminal());
    }

    #[test]
    fn cancelled_job_detection() {
        let mut job = sample_job();
        assert!(!job.is_cancelled());
        job.cancelled_at = Some(Utc::now());
        assert!(job.is_cancelled());

        let mut job = sample_job();
        job.status = JobStatus::Cancelled;
        assert!(job.is_cancelled());
    }

    #[test]
    fn job_serde_roundtrip() {
        let job = sample_job();
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(job, back);
    }
}
