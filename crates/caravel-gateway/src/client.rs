//! Gateway trait definition.
//!
//! [`JobGateway`] defines the contract for reading jobs and reading or
//! updating their import reports. Model types live in
//! [`caravel_types::job`] and [`caravel_types::report`].

use async_trait::async_trait;
use caravel_types::job::{Job, JobId, JobStatus};
use caravel_types::report::{ImportReport, ReportUpdate};

use crate::error;

/// Contract for job and report persistence.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn JobGateway>`.
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Fetch a job by id, including its current status and cancellation
    /// marker.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`](crate::GatewayError::NotFound)
    /// if the job does not exist, or another
    /// [`GatewayError`](crate::GatewayError) on transport failure.
    async fn get_job(&self, job: &JobId) -> error::Result<Job>;

    /// Transition a job to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`](crate::GatewayError) if the job does not
    /// exist or the update cannot be applied.
    async fn update_job_status(&self, job: &JobId, status: JobStatus) -> error::Result<()>;

    /// Fetch the current import report for a job.
    ///
    /// Background workers on the destination side advance the report's
    /// `imported_*` counters; callers polling for completion should
    /// re-fetch rather than cache.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`](crate::GatewayError) if the report does
    /// not exist or cannot be fetched.
    async fn get_import_report(&self, job: &JobId) -> error::Result<ImportReport>;

    /// Apply a partial counter update to a job's import report.
    ///
    /// Updates are monotonic: see [`ReportUpdate::apply`] for the floor
    /// semantics.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`](crate::GatewayError) if the report does
    /// not exist or the update cannot be applied.
    async fn update_import_report(&self, job: &JobId, update: ReportUpdate) -> error::Result<()>;

    /// Stamp the report's `end_time`, marking the push phase finished.
    ///
    /// Idempotent: a second call leaves the original timestamp in place.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`](crate::GatewayError) if the report does
    /// not exist.
    async fn finalize_report(&self, job: &JobId) -> error::Result<()>;
}
