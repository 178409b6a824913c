//! Issues step: the heavy step of every table.
//!
//! Pulls a page of issues, enriches each with its comment thread,
//! resolves label references against the accumulated context, and
//! pushes the page downstream. On the first page it initializes the
//! report's batch plan (`ceil(total / page_size)` batches) through the
//! gateway so the wait step has a target to poll against.

use std::sync::Arc;

use async_trait::async_trait;
use caravel_engine::batch::run_batch;
use caravel_engine::client::{DestinationClient, SourceClient, SourcePage};
use caravel_engine::context::{PageContext, StepContext};
use caravel_engine::guard::protect;
use caravel_engine::scope::with_log;
use caravel_engine::step::{Step, StepInput, StepName};
use caravel_gateway::JobGateway;
use caravel_types::entity::{EntityKind, EntityRef, IssuePayload};
use caravel_types::error::ImportError;
use caravel_types::report::ReportUpdate;

use super::labels::LABELS_STEP;
use super::DEST_CONCURRENCY;

pub const ISSUES_STEP: StepName = StepName::new("issues");

/// Pull, enrich and load one page of issues per invocation.
pub struct IssuesStep {
    source: Arc<dyn SourceClient>,
    destination: Arc<dyn DestinationClient>,
    gateway: Arc<dyn JobGateway>,
    page_size: u64,
    dependencies: [StepName; 1],
}

impl IssuesStep {
    #[must_use]
    pub fn new(
        source: Arc<dyn SourceClient>,
        destination: Arc<dyn DestinationClient>,
        gateway: Arc<dyn JobGateway>,
        page_size: u64,
    ) -> Self {
        Self {
            source,
            destination,
            gateway,
            page_size,
            dependencies: [LABELS_STEP],
        }
    }
}

#[async_trait]
impl Step for IssuesStep {
    fn name(&self) -> StepName {
        ISSUES_STEP
    }

    fn dependencies(&self) -> &[StepName] {
        &self.dependencies
    }

    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError> {
        let mut page = with_log(
            ISSUES_STEP.as_str(),
            "pull",
            |p: &SourcePage<IssuePayload>| Some(p.items.len()),
            self.source
                .fetch_issues(&input.job, input.resume.cursor, self.page_size),
        )
        .await?;

        // First page sizes the destination's batch plan so background
        // workers and the wait step share a total.
        if input.resume.cursor == 0 {
            if let Some(total) = page.total {
                self.gateway
                    .update_import_report(
                        &input.job.id,
                        ReportUpdate::batch_plan(
                            self.page_size,
                            total.div_ceil(self.page_size.max(1)),
                            total,
                        ),
                    )
                    .await?;
            }
        }

        for issue in &mut page.items {
            issue.comments = self
                .source
                .fetch_comments(&input.job, &issue.external_id)
                .await?;
        }

        let fetched = page.items.len() as u64;
        let job = input.job.clone();
        let carry = input.carry.clone();
        let destination = self.destination.clone();

        let refs = run_batch(page.items, DEST_CONCURRENCY, move |issue| {
            let job = job.clone();
            let carry = carry.clone();
            let destination = destination.clone();
            async move {
                let label_ids: Vec<String> = issue
                    .label_refs
                    .iter()
                    .filter_map(|external| carry.label_id(external).map(str::to_owned))
                    .collect();
                let outcome = protect(
                    &job.id,
                    EntityKind::Issue,
                    destination.create_issue(&job, &issue, &label_ids),
                )
                .await?;
                Some(EntityRef {
                    external_id: issue.external_id,
                    destination_id: outcome.destination_id().to_owned(),
                })
            }
        })
        .await;

        tracing::info!(
            job = %input.job.id,
            fetched,
            loaded = refs.len(),
            "Issue page loaded"
        );

        Ok(StepContext {
            issues: Some(refs),
            page_ctx: PageContext {
                has_more: page.has_more,
                cursor: page.cursor,
                processed: fetched,
            },
            ..StepContext::empty()
        })
    }
}
