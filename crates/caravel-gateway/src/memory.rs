//! In-memory implementation of [`JobGateway`].
//!
//! Uses a single `Mutex` over the job and report tables. Backs local
//! runs and tests; a deployment against the product API implements the
//! same trait over HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use caravel_types::job::{Job, JobId, JobStatus};
use caravel_types::report::{ImportReport, ReportUpdate};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::client::JobGateway;
use crate::error::{self, GatewayError};

#[derive(Default)]
struct Tables {
    jobs: HashMap<JobId, Job>,
    reports: HashMap<JobId, ImportReport>,
}

/// In-memory job and report storage.
///
/// Cheap to clone; clones share the same underlying tables.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job along with a fresh report for it.
    pub async fn seed_job(&self, job: Job) {
        let mut tables = self.tables.lock().await;
        tables.reports.insert(job.id.clone(), ImportReport::default());
        tables.jobs.insert(job.id.clone(), job);
    }

    /// Set a job's cancellation marker, as the product API does when a
    /// user aborts an import.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the job does not exist.
    pub async fn cancel_job(&self, job: &JobId) -> error::Result<()> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .jobs
            .get_mut(job)
            .ok_or_else(|| GatewayError::not_found("job", job.as_str()))?;
        record.cancelled_at = Some(Utc::now());
        record.status = JobStatus::Cancelled;
        Ok(())
    }

    /// Advance `imported_batch_count` by `n`, simulating the destination's
    /// background workers draining pushed batches.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the report does not exist.
    pub async fn mark_batches_imported(&self, job: &JobId, n: u64) -> error::Result<()> {
        let mut tables = self.tables.lock().await;
        let report = tables
            .reports
            .get_mut(job)
            .ok_or_else(|| GatewayError::not_found("report", job.as_str()))?;
        report.imported_batch_count =
            (report.imported_batch_count + n).min(report.total_batch_count);
        Ok(())
    }
}

#[async_trait]
impl JobGateway for InMemoryGateway {
    async fn get_job(&self, job: &JobId) -> error::Result<Job> {
        let tables = self.tables.lock().await;
        tables
            .jobs
            .get(job)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("job", job.as_str()))
    }

    async fn update_job_status(&self, job: &JobId, status: JobStatus) -> error::Result<()> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .jobs
            .get_mut(job)
            .ok_or_else(|| GatewayError::not_found("job", job.as_str()))?;
        record.status = status;
        Ok(())
    }

    async fn get_import_report(&self, job: &JobId) -> error::Result<ImportReport> {
        let tables = self.tables.lock().await;
        tables
            .reports
            .get(job)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("report", job.as_str()))
    }

    async fn update_import_report(&self, job: &JobId, update: ReportUpdate) -> error::Result<()> {
        let mut tables = self.tables.lock().await;
        let report = tables
            .reports
            .get_mut(job)
            .ok_or_else(|| GatewayError::not_found("report", job.as_str()))?;
        update.apply(report);
        Ok(())
    }

    async fn finalize_report(&self, job: &JobId) -> error::Result<()> {
        let mut tables = self.tables.lock().await;
        let report = tables
            .reports
            .get_mut(job)
            .ok_or_else(|| GatewayError::not_found("report", job.as_str()))?;
        if report.end_time.is_none() {
            report.end_time = Some(Utc::now());
        }
        Ok(())
    }
}
