//! Destination entity payloads.
//!
//! Connector steps transform source records into these shapes before
//! handing them to the destination write API. Every payload carries an
//! `(external_source, external_id)` pair, which is what re-run safety
//! keys on: the destination treats a payload whose pair already exists as
//! a skip, not a duplicate create.

use serde::{Deserialize, Serialize};

/// Kind of entity being migrated, for logs and report counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Label,
    Issue,
    Comment,
    Page,
    User,
}

impl EntityKind {
    /// Singular lowercase name for log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Issue => "issue",
            Self::Comment => "comment",
            Self::Page => "page",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from a source record to the destination record created for it.
///
/// Steps accumulate these in their context so later steps can resolve
/// source references (e.g. an issue's label names) to destination ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub external_id: String,
    pub destination_id: String,
}

/// A label to create at the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPayload {
    pub external_id: String,
    pub external_source: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// An issue (work item) to create at the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePayload {
    pub external_id: String,
    pub external_source: String,
    pub title: String,
    #[serde(default)]
    pub description_html: String,
    /// External ids of labels attached to this issue, resolved to
    /// destination ids at load time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentPayload>,
}

/// A comment attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPayload {
    pub external_id: String,
    pub external_source: String,
    pub issue_external_id: String,
    pub body_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
}

/// A document page to create at the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePayload {
    pub external_id: String,
    pub external_source: String,
    pub title: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_external_id: Option<String>,
}

/// Build the composite external id used for destination dedup lookups.
///
/// Scoping by project and resource keeps ids from colliding when two jobs
/// import the same upstream project into different destinations.
#[must_use]
pub fn external_id(project_id: &str, resource_id: &str, source_id: &str) -> String {
    format!("{project_id}_{resource_id}_{source_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_names() {
        assert_eq!(EntityKind::Label.as_str(), "label");
        assert_eq!(EntityKind::Issue.to_string(), "issue");
    }

    #[test]
    fn composite_external_id() {
        assert_eq!(external_id("proj", "res", "10001"), "proj_res_10001");
    }

    #[test]
    fn issue_payload_serde_skips_empty() {
        let issue = IssuePayload {
            external_id: "p_r_1".into(),
            external_source: "jira".into(),
            title: "Fix login".into(),
            description_html: String::new(),
            label_refs: vec![],
            assignee_email: None,
            comments: vec![],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("label_refs").is_none());
        assert!(json.get("comments").is_none());
        assert!(json.get("assignee_email").is_none());
    }

    #[test]
    fn label_payload_roundtrip() {
        let label = LabelPayload {
            external_id: "p_r_bug".into(),
            external_source: "gitlab".into(),
            name: "bug".into(),
            color: Some("#d73a4a".into()),
        };
        let json = serde_json::to_string(&label).unwrap();
        let back: LabelPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(label, back);
    }
}
