//! Wait for the destination's background workers to drain pushed
//! batches.
//!
//! The engine hands batches to the destination and moves on; actual
//! ingestion happens in background workers that advance the report's
//! `imported_batch_count`. This step polls the report through the
//! runner's pagination loop: behind means sleep and return
//! `has_more = true`, caught up means done. The poll is bounded; a job
//! whose workers stall is failed rather than held open forever.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use caravel_gateway::JobGateway;
use caravel_types::error::ImportError;
use caravel_types::job::JobStatus;

use crate::context::{PageContext, StepContext};
use crate::step::{Step, StepInput, StepName};

pub const WAIT_STEP: StepName = StepName::new("wait_for_background_processing");

const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u64 = 120;

/// Polls `imported_batch_count >= total_batch_count` on the import
/// report, one poll per invocation.
pub struct WaitForBackgroundProcessing {
    gateway: Arc<dyn JobGateway>,
    dependencies: Vec<StepName>,
    poll_delay: Duration,
    max_attempts: u64,
}

impl WaitForBackgroundProcessing {
    /// Default poll: 5s delay, 120 attempts (ten minutes of stall before
    /// the job fails).
    #[must_use]
    pub fn new(gateway: Arc<dyn JobGateway>, dependencies: Vec<StepName>) -> Self {
        Self {
            gateway,
            dependencies,
            poll_delay: DEFAULT_POLL_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

#[async_trait]
impl Step for WaitForBackgroundProcessing {
    fn name(&self) -> StepName {
        WAIT_STEP
    }

    fn dependencies(&self) -> &[StepName] {
        &self.dependencies
    }

    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError> {
        // The runner's cursor doubles as the attempt counter.
        let attempt = input.resume.cursor;
        let job_id = &input.job.id;

        if attempt == 0 {
            self.gateway
                .update_job_status(job_id, JobStatus::Processing)
                .await?;
        }

        let report = self.gateway.get_import_report(job_id).await?;
        if report.batches_caught_up() {
            tracing::info!(
                job = %job_id,
                imported = report.imported_batch_count,
                total = report.total_batch_count,
                attempts = attempt + 1,
                "Background processing caught up"
            );
            return Ok(StepContext::empty());
        }

        if attempt + 1 >= self.max_attempts {
            return Err(ImportError::internal(
                "IMPORT_STALLED",
                format!(
                    "background workers stalled at {}/{} batches after {} polls",
                    report.imported_batch_count,
                    report.total_batch_count,
                    attempt + 1
                ),
            ));
        }

        tracing::debug!(
            job = %job_id,
            imported = report.imported_batch_count,
            total = report.total_batch_count,
            attempt = attempt + 1,
            "Batches still processing, polling again"
        );
        tokio::time::sleep(self.poll_delay).await;

        Ok(StepContext {
            page_ctx: PageContext {
                has_more: true,
                cursor: attempt + 1,
                processed: 0,
            },
            ..StepContext::empty()
        })
    }
}
