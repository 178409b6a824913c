//! Execute the `run` command: import one job from a job file.
//!
//! The job file is the local stand-in for the queue message that
//! triggers an import in a deployment. Source data comes from a fixture
//! file and the destination is in-memory, so a run is fully offline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use caravel_connectors::registry::{steps_for, StepSettings};
use caravel_connectors::{FixtureSource, InMemoryDestination};
use caravel_engine::runner::Runner;
use caravel_gateway::{InMemoryGateway, JobGateway};
use caravel_types::job::{Job, JobId, JobStatus, SourceKind};
use chrono::Utc;
use serde::Deserialize;

/// On-disk job description.
#[derive(Debug, Deserialize)]
struct JobFile {
    job_id: String,
    source: SourceKind,
    workspace_id: String,
    project_id: String,
    /// Path to the fixture JSON serving as the source, relative to the
    /// job file.
    fixture: PathBuf,
    #[serde(default)]
    credential: Option<String>,
    #[serde(default = "default_page_size")]
    page_size: u64,
    #[serde(default)]
    config: serde_json::Value,
}

fn default_page_size() -> u64 {
    50
}

pub async fn execute(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading job file {}", path.display()))?;
    let job_file: JobFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing job file {}", path.display()))?;

    let fixture_path = path
        .parent()
        .map_or_else(|| job_file.fixture.clone(), |dir| dir.join(&job_file.fixture));
    let source = Arc::new(
        FixtureSource::from_file(&fixture_path)
            .map_err(|e| anyhow::anyhow!("loading fixture: {e}"))?,
    );

    let job_id = JobId::new(job_file.job_id.clone());
    let job = Job {
        id: job_id.clone(),
        report_id: format!("report_{}", job_file.job_id).into(),
        workspace_id: job_file.workspace_id.into(),
        project_id: job_file.project_id.into(),
        source: job_file.source,
        config: job_file.config,
        credential: job_file.credential.unwrap_or_default().into(),
        status: JobStatus::Created,
        created_at: Utc::now(),
        cancelled_at: None,
    };

    let gateway = InMemoryGateway::new();
    gateway.seed_job(job).await;
    spawn_background_workers(gateway.clone(), job_id.clone());

    let destination = Arc::new(InMemoryDestination::new());
    let steps = steps_for(
        job_file.source,
        source,
        destination.clone(),
        Arc::new(gateway.clone()),
        StepSettings {
            page_size: job_file.page_size,
        },
    );

    let runner = Runner::new(Arc::new(gateway.clone()), steps);
    let outcome = runner.run(&job_id).await?;

    println!("Job {}: {}", job_id, outcome.status.as_str());
    for metric in &outcome.steps {
        println!(
            "  {:<36} pages={:<4} items={:<6} {:.2}s",
            metric.step.as_str(),
            metric.pages,
            metric.items,
            metric.duration_secs
        );
    }

    let report = gateway.get_import_report(&job_id).await?;
    println!(
        "Report: {} issues ({} batches), {} created at destination, {:.2}s total",
        report.total_issue_count,
        report.total_batch_count,
        destination.created_count(),
        outcome.duration_secs
    );

    Ok(())
}

/// Local stand-in for the destination's background ingestion workers:
/// marks planned batches imported shortly after the batch plan lands so
/// the wait step can observe progress.
fn spawn_background_workers(gateway: InMemoryGateway, job_id: JobId) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let Ok(report) = gateway.get_import_report(&job_id).await else {
                return;
            };
            if report.end_time.is_some() {
                return;
            }
            if report.total_batch_count > report.imported_batch_count {
                if let Err(err) = gateway.mark_batches_imported(&job_id, 1).await {
                    tracing::warn!(job = %job_id, "Worker stand-in stopped: {err}");
                    return;
                }
            }
        }
    });
}
