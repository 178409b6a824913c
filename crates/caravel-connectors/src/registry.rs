//! Connector registry: one step table per supported source.
//!
//! Tables are ordered descriptors; the runner's topological sort keeps
//! declared dependencies honest, so table order only matters as the
//! tie-break.

use std::sync::Arc;

use caravel_engine::client::{DestinationClient, SourceClient};
use caravel_engine::step::{Step, StepName};
use caravel_engine::steps::WaitForBackgroundProcessing;
use caravel_gateway::JobGateway;
use caravel_types::job::SourceKind;

use crate::steps::issues::ISSUES_STEP;
use crate::steps::pages::PAGES_STEP;
use crate::steps::{IssuesStep, LabelsStep, PagesStep};

/// Tuning knobs shared by every step in a table.
#[derive(Debug, Clone, Copy)]
pub struct StepSettings {
    /// Source page size; also the destination batch size for the report
    /// batch plan.
    pub page_size: u64,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

/// Build the step table for one source kind.
///
/// Issue trackers get `labels -> issues -> wait`; document tools
/// (Notion) get `pages -> wait`; Slack imports threads as issues with
/// comments, so it shares the tracker table.
#[must_use]
pub fn steps_for(
    kind: SourceKind,
    source: Arc<dyn SourceClient>,
    destination: Arc<dyn DestinationClient>,
    gateway: Arc<dyn JobGateway>,
    settings: StepSettings,
) -> Vec<Arc<dyn Step>> {
    match kind {
        SourceKind::Notion => {
            let mut table: Vec<Arc<dyn Step>> = vec![Arc::new(PagesStep::new(
                source,
                destination,
                settings.page_size,
            ))];
            table.push(Arc::new(WaitForBackgroundProcessing::new(
                gateway,
                vec![PAGES_STEP],
            )));
            table
        }
        // Jira, Asana, GitLab, ClickUp, Linear, Slack, CSV all follow
        // the issue-tracker shape.
        _ => {
            let mut table: Vec<Arc<dyn Step>> = vec![
                Arc::new(LabelsStep::new(
                    source.clone(),
                    destination.clone(),
                    settings.page_size,
                )),
                Arc::new(IssuesStep::new(
                    source,
                    destination,
                    gateway.clone(),
                    settings.page_size,
                )),
            ];
            table.push(Arc::new(WaitForBackgroundProcessing::new(
                gateway,
                vec![ISSUES_STEP],
            )));
            table
        }
    }
}

/// Step names in a table, for the CLI listing.
#[must_use]
pub fn table_shape(kind: SourceKind) -> Vec<StepName> {
    match kind {
        SourceKind::Notion => vec![
            PAGES_STEP,
            caravel_engine::steps::wait::WAIT_STEP,
        ],
        _ => vec![
            crate::steps::labels::LABELS_STEP,
            ISSUES_STEP,
            caravel_engine::steps::wait::WAIT_STEP,
        ],
    }
}
