//! The step contract.
//!
//! A connector is an ordered table of [`Step`]s; each step owns one
//! entity kind's pull/transform/load loop and declares which steps must
//! drain before it may start.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use caravel_types::error::ImportError;
use caravel_types::job::Job;

use crate::context::{PageContext, StepContext};

/// Step identifier. `Copy` so step tables can be built from constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepName(&'static str);

impl StepName {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static description of a step: its name and hard ordering edges.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub name: StepName,
    pub dependencies: Vec<StepName>,
}

/// Per-invocation input handed to [`Step::execute`].
#[derive(Clone)]
pub struct StepInput {
    /// The job being run, re-fetched each pagination iteration so steps
    /// observe status and cancellation changes.
    pub job: Arc<Job>,
    /// Where to resume: the `cursor` returned by the previous invocation
    /// of this step, or zeroed on the first one.
    pub resume: PageContext,
    /// Everything merged so far, from prior steps and prior pages.
    pub carry: Arc<StepContext>,
}

/// One unit of migration work.
///
/// `execute` handles ONE page per invocation; returning
/// `page_ctx.has_more = true` asks the runner to call again with the
/// returned cursor. Steps must be idempotent across restarted runs:
/// check for an equivalent existing destination resource before
/// creating one. Per-item faults belong behind
/// [`protect`](crate::guard::protect); an `Err` from `execute` aborts
/// the whole run.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> StepName;

    /// Steps that must fully drain before this one starts.
    fn dependencies(&self) -> &[StepName] {
        &[]
    }

    /// Run one page of work.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on a failure that invalidates the whole
    /// run (config, auth, or an unrecoverable pull).
    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError>;
}

impl StepDescriptor {
    #[must_use]
    pub fn of(step: &dyn Step) -> Self {
        Self {
            name: step.name(),
            dependencies: step.dependencies().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (step tables are `Vec<Arc<dyn Step>>`).
    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn Step) {}
    }

    #[test]
    fn step_name_is_copy_and_displays() {
        const LABELS: StepName = StepName::new("labels");
        let copied = LABELS;
        assert_eq!(copied, LABELS);
        assert_eq!(copied.to_string(), "labels");
    }
}
