//! Engine error types.
//!
//! Two levels, following the split between connector-level and
//! engine-level failures: [`EngineError::Step`] wraps a structured
//! [`ImportError`] raised by a step body; everything else is either a
//! step-graph configuration error or [`EngineError::Infrastructure`].

use caravel_types::error::ImportError;

use crate::step::StepName;

/// Errors produced by the [`Runner`](crate::Runner).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A step's `execute` returned an error, aborting the run.
    #[error("step '{step}' failed: {source}")]
    Step {
        step: StepName,
        #[source]
        source: ImportError,
    },

    /// Two steps in the table share a name.
    #[error("duplicate step name '{0}' in step table")]
    DuplicateStep(StepName),

    /// A step depends on a name not present in the table.
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency {
        step: StepName,
        dependency: StepName,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle among steps: {}", format_names(remaining))]
    DependencyCycle { remaining: Vec<StepName> },

    /// Engine-level failure outside any step (gateway transport, task
    /// panic).
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl EngineError {
    /// Wrap a step body's error with the step that raised it.
    #[must_use]
    pub fn step(step: StepName, source: ImportError) -> Self {
        Self::Step { step, source }
    }

    /// The underlying [`ImportError`], if this is a step failure.
    #[must_use]
    pub fn as_import_error(&self) -> Option<&ImportError> {
        match self {
            Self::Step { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether this error came from the step table shape rather than
    /// execution.
    #[must_use]
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStep(_) | Self::UnknownDependency { .. } | Self::DependencyCycle { .. }
        )
    }
}

fn format_names(names: &[StepName]) -> String {
    names
        .iter()
        .map(StepName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
