//! Uniform connector client traits.
//!
//! Every supported source (Jira, Asana, GitLab, ...) is adapted to
//! [`SourceClient`]'s paginated list operations; the destination
//! workspace API is adapted to [`DestinationClient`]'s per-item
//! create-or-skip operations. Step bodies are written once against
//! these traits.

use async_trait::async_trait;
use caravel_types::entity::{CommentPayload, IssuePayload, LabelPayload, PagePayload};
use caravel_types::error::ImportError;
use caravel_types::job::Job;

/// One page of a paginated source listing.
#[derive(Debug, Clone)]
pub struct SourcePage<T> {
    pub items: Vec<T>,
    /// Offset the next pull should start from.
    pub cursor: u64,
    pub has_more: bool,
    /// Total matching items upstream, when the source reports one.
    /// Available on the first page for sources that support it; used to
    /// size the destination's batch plan.
    pub total: Option<u64>,
}

impl<T> SourcePage<T> {
    /// A final, empty page. Sources return this past the end of data.
    #[must_use]
    pub fn drained(cursor: u64) -> Self {
        Self {
            items: Vec::new(),
            cursor,
            has_more: false,
            total: None,
        }
    }
}

/// Paginated read access to a third-party source.
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn SourceClient>`.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// List labels starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on an upstream failure.
    async fn fetch_labels(
        &self,
        job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<LabelPayload>, ImportError>;

    /// List issues starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on an upstream failure.
    async fn fetch_issues(
        &self,
        job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<IssuePayload>, ImportError>;

    /// List the comments of one issue. Comment threads are small enough
    /// upstream that sources return them unpaginated.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on an upstream failure.
    async fn fetch_comments(
        &self,
        job: &Job,
        issue_external_id: &str,
    ) -> Result<Vec<CommentPayload>, ImportError>;

    /// List document pages starting at `offset`. Sources without a
    /// pages concept return [`SourcePage::drained`].
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on an upstream failure.
    async fn fetch_pages(
        &self,
        job: &Job,
        offset: u64,
        limit: u64,
    ) -> Result<SourcePage<PagePayload>, ImportError>;
}

/// Result of a create-or-skip call at the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new resource was created with this destination id.
    Created(String),
    /// An equivalent resource already existed; its id is returned and
    /// nothing was written.
    Exists(String),
}

impl CreateOutcome {
    /// The destination id, whichever way it was obtained.
    #[must_use]
    pub fn destination_id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Exists(id) => id,
        }
    }

    #[must_use]
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Write access to the destination workspace.
///
/// All operations are create-or-skip: an equivalent existing resource
/// yields [`CreateOutcome::Exists`] so restarted runs stay idempotent.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ImportError`] when the destination rejects the label.
    async fn create_label(
        &self,
        job: &Job,
        label: &LabelPayload,
    ) -> Result<CreateOutcome, ImportError>;

    /// Create an issue with its comments. `label_ids` are destination
    /// ids already resolved from the accumulated context.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] when the destination rejects the issue.
    async fn create_issue(
        &self,
        job: &Job,
        issue: &IssuePayload,
        label_ids: &[String],
    ) -> Result<CreateOutcome, ImportError>;

    /// # Errors
    ///
    /// Returns [`ImportError`] when the destination rejects the page.
    async fn create_page(
        &self,
        job: &Job,
        page: &PagePayload,
    ) -> Result<CreateOutcome, ImportError>;
}
