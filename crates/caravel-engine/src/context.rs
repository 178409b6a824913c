//! Step execution context and merge semantics.
//!
//! Every [`Step`](crate::Step) invocation returns a [`StepContext`]
//! describing what it created and whether more pages remain. The runner
//! folds these into one accumulated context per run, so later steps can
//! resolve references created by earlier ones (an issues step looks up
//! label ids created by the labels step).

use caravel_types::entity::EntityRef;
use serde::{Deserialize, Serialize};

/// Pagination state for one step invocation.
///
/// `cursor` is the offset the NEXT invocation should pull from; a step
/// advances it before returning. `processed` counts the items handled by
/// this invocation only; the accumulated context sums it across pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub has_more: bool,
    pub cursor: u64,
    pub processed: u64,
}

/// Output of one step invocation, merged into the run's accumulated
/// context.
///
/// Entity lists are `None` when the step does not touch that kind, which
/// keeps merge an identity for untouched kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepContext {
    pub labels: Option<Vec<EntityRef>>,
    pub issues: Option<Vec<EntityRef>>,
    pub pages: Option<Vec<EntityRef>>,
    pub comments: Option<Vec<EntityRef>>,
    pub users: Option<Vec<EntityRef>>,
    pub page_ctx: PageContext,
    /// Opaque per-step carry-over (e.g. a resumable remote cursor token).
    pub state: Option<serde_json::Value>,
}

impl StepContext {
    /// The canonical zero value: no entities, `has_more = false`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no invocation has contributed anything yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Fold `other` into `self`.
    ///
    /// Entity lists concatenate (`None` is the identity); `state` is
    /// replaced when `other` carries one; pagination folds with
    /// `has_more` OR'd, `cursor` maxed, and `processed` summed. With
    /// those component operations the merge is associative and
    /// [`empty`](Self::empty) is its identity on both sides.
    pub fn merge(&mut self, other: StepContext) {
        fn extend(acc: &mut Option<Vec<EntityRef>>, incoming: Option<Vec<EntityRef>>) {
            if let Some(items) = incoming {
                acc.get_or_insert_with(Vec::new).extend(items);
            }
        }

        extend(&mut self.labels, other.labels);
        extend(&mut self.issues, other.issues);
        extend(&mut self.pages, other.pages);
        extend(&mut self.comments, other.comments);
        extend(&mut self.users, other.users);

        self.page_ctx.has_more |= other.page_ctx.has_more;
        self.page_ctx.cursor = self.page_ctx.cursor.max(other.page_ctx.cursor);
        self.page_ctx.processed += other.page_ctx.processed;

        if other.state.is_some() {
            self.state = other.state;
        }
    }

    /// [`merge`](Self::merge) as an owned fold operation.
    #[must_use]
    pub fn merged(mut self, other: StepContext) -> Self {
        self.merge(other);
        self
    }

    /// Destination ids of created labels, keyed lookup by external id.
    #[must_use]
    pub fn label_id(&self, external_id: &str) -> Option<&str> {
        self.labels.as_deref().and_then(|refs| {
            refs.iter()
                .find(|r| r.external_id == external_id)
                .map(|r| r.destination_id.as_str())
        })
    }
}
