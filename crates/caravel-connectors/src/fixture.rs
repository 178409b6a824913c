//! Offline connector: a JSON-fixture source and an in-memory
//! destination.
//!
//! Backs the CLI's local runs and the integration tests. The fixture
//! source serves pre-transformed payloads with real pagination; the
//! in-memory destination implements create-or-skip keyed the same way
//! the workspace API dedups (labels by name, issues and pages by
//! external id).

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use caravel_engine::client::{CreateOutcome, DestinationClient, SourceClient, SourcePage};
use caravel_types::entity::{CommentPayload, IssuePayload, LabelPayload, PagePayload};
use caravel_types::error::ImportError;
use caravel_types::job::Job;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Fixture source
// ---------------------------------------------------------------------------

/// On-disk shape of a fixture file.
#[derive(Debug, Default, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
    #[serde(default)]
    pub issues: Vec<IssuePayload>,
    #[serde(default)]
    pub pages: Vec<PagePayload>,
    /// Comment threads keyed by issue external id.
    #[serde(default)]
    pub comments: HashMap<String, Vec<CommentPayload>>,
}

/// Serves fixture payloads through the paginated source contract.
#[derive(Debug)]
pub struct FixtureSource {
    data: FixtureData,
}

impl FixtureSource {
    #[must_use]
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    /// Parse a fixture from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] with category `config` when the value
    /// does not match [`FixtureData`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, ImportError> {
        let data = serde_json::from_value(value).map_err(|e| {
            ImportError::config("FIXTURE_SHAPE", format!("invalid fixture payload: {e}"))
        })?;
        Ok(Self::new(data))
    }

    /// Load a fixture file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] with category `config` when the file is
    /// missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self, ImportError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ImportError::config(
                "FIXTURE_READ",
                format!("cannot read fixture {}: {e}", path.display()),
            )
        })?;
        let data = serde_json::from_str(&raw).map_err(|e| {
            ImportError::config(
                "FIXTURE_PARSE",
                format!("cannot parse fixture {}: {e}", path.display()),
            )
        })?;
        Ok(Self::new(data))
    }

    fn slice<T: Clone>(items: &[T], offset: u64, limit: u64) -> SourcePage<T> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(items.len());
        let end = start.saturating_add(usize::try_from(limit).unwrap_or(usize::MAX)).min(items.len());
        SourcePage {
            items: items[start..end].to_vec(),
            cursor: end as u64,
            has_more: end < items.len(),
            total: Some(items.len() as u64),
        }
    }
}

#[async_trait]
impl SourceClient for FixtureSource {
    async fn fetch_labels(
        &self,
        _job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<LabelPayload>, ImportError> {
        Ok(Self::slice(&self.data.labels, offset, limit))
    }

    async fn fetch_issues(
        &self,
        _job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<IssuePayload>, ImportError> {
        Ok(Self::slice(&self.data.issues, offset, limit))
    }

    async fn fetch_comments(
        &self,
        _job: &Job,
        issue_external_id: &str,
    ) -> Result<Vec<CommentPayload>, ImportError> {
        Ok(self
            .data
            .comments
            .get(issue_external_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_pages(
        &self,
        _job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<PagePayload>, ImportError> {
        Ok(Self::slice(&self.data.pages, offset, limit))
    }
}

// ---------------------------------------------------------------------------
// In-memory destination
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DestinationTables {
    /// Label name -> destination id (the workspace dedups labels by name).
    labels: HashMap<String, String>,
    /// External id -> destination id.
    issues: HashMap<String, String>,
    pages: HashMap<String, String>,
    created: u64,
}

/// Create-or-skip destination backed by hash maps.
#[derive(Default)]
pub struct InMemoryDestination {
    tables: Mutex<DestinationTables>,
    next_id: AtomicU64,
    /// External ids (or label names) forced to fail, for fault tests.
    rejects: Mutex<Vec<String>>,
}

impl InMemoryDestination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a label, as a workspace that already has one by this
    /// name would.
    pub fn seed_label(&self, name: &str) {
        let id = self.mint_id();
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .labels
            .insert(name.to_owned(), id);
    }

    /// Force creates matching `key` (label name or external id) to be
    /// rejected with a data error.
    pub fn reject(&self, key: &str) {
        self.rejects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(key.to_owned());
    }

    /// How many creates actually happened (skips excluded).
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .created
    }

    fn mint_id(&self) -> String {
        format!("dest-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn is_rejected(&self, key: &str) -> bool {
        self.rejects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .any(|k| k == key)
    }

    fn create_or_skip(
        &self,
        select: impl Fn(&mut DestinationTables) -> &mut HashMap<String, String>,
        key: &str,
    ) -> CreateOutcome {
        let id = self.mint_id();
        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = select(&mut tables).get(key) {
            return CreateOutcome::Exists(existing.clone());
        }
        select(&mut tables).insert(key.to_owned(), id.clone());
        tables.created += 1;
        CreateOutcome::Created(id)
    }
}

#[async_trait]
impl DestinationClient for InMemoryDestination {
    async fn create_label(
        &self,
        _job: &Job,
        label: &LabelPayload,
    ) -> Result<CreateOutcome, ImportError> {
        if self.is_rejected(&label.name) {
            return Err(ImportError::data(
                "LABEL_REJECTED",
                format!("destination rejected label '{}'", label.name),
            ));
        }
        Ok(self.create_or_skip(|t| &mut t.labels, &label.name))
    }

    async fn create_issue(
        &self,
        _job: &Job,
        issue: &IssuePayload,
        _label_ids: &[String],
    ) -> Result<CreateOutcome, ImportError> {
        if self.is_rejected(&issue.external_id) {
            return Err(ImportError::data(
                "ISSUE_REJECTED",
                format!("destination rejected issue '{}'", issue.external_id),
            ));
        }
        Ok(self.create_or_skip(|t| &mut t.issues, &issue.external_id))
    }

    async fn create_page(
        &self,
        _job: &Job,
        page: &PagePayload,
    ) -> Result<CreateOutcome, ImportError> {
        if self.is_rejected(&page.external_id) {
            return Err(ImportError::data(
                "PAGE_REJECTED",
                format!("destination rejected page '{}'", page.external_id),
            ));
        }
        Ok(self.create_or_skip(|t| &mut t.pages, &page.external_id))
    }
}
