//! End-to-end runner behavior against the in-memory gateway.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caravel_engine::context::{PageContext, StepContext};
use caravel_engine::runner::Runner;
use caravel_engine::step::{Step, StepInput, StepName};
use caravel_engine::EngineError;
use caravel_gateway::{InMemoryGateway, JobGateway};
use caravel_types::error::ImportError;
use caravel_types::job::{Job, JobId, JobStatus, SourceKind};
use chrono::Utc;

fn sample_job(id: &str) -> Job {
    Job {
        id: JobId::new(id),
        report_id: "report_1".into(),
        workspace_id: "ws_1".into(),
        project_id: "proj_1".into(),
        source: SourceKind::Jira,
        config: serde_json::json!({}),
        credential: "cred_1".into(),
        status: JobStatus::Created,
        created_at: Utc::now(),
        cancelled_at: None,
    }
}

/// Records each invocation and paginates a fixed number of pages.
struct RecordingStep {
    name: StepName,
    dependencies: Vec<StepName>,
    pages: u64,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Step for RecordingStep {
    fn name(&self) -> StepName {
        self.name
    }

    fn dependencies(&self) -> &[StepName] {
        &self.dependencies
    }

    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError> {
        self.log.lock().unwrap().push(self.name.to_string());
        let page = input.resume.cursor / 10 + 1;
        Ok(StepContext {
            page_ctx: PageContext {
                has_more: page < self.pages,
                cursor: input.resume.cursor + 10,
                processed: 10,
            },
            ..StepContext::empty()
        })
    }
}

struct FailingStep;

#[async_trait]
impl Step for FailingStep {
    fn name(&self) -> StepName {
        StepName::new("failing")
    }

    async fn execute(&self, _input: StepInput) -> Result<StepContext, ImportError> {
        Err(ImportError::auth("TOKEN_EXPIRED", "credential expired"))
    }
}

/// Cancels its own job through the gateway, then asks for another page.
struct SelfCancellingStep {
    gateway: InMemoryGateway,
}

#[async_trait]
impl Step for SelfCancellingStep {
    fn name(&self) -> StepName {
        StepName::new("self_cancelling")
    }

    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError> {
        self.gateway.cancel_job(&input.job.id).await?;
        Ok(StepContext {
            page_ctx: PageContext {
                has_more: true,
                cursor: input.resume.cursor + 10,
                processed: 10,
            },
            ..StepContext::empty()
        })
    }
}

async fn seeded_gateway(job_id: &str) -> InMemoryGateway {
    let gateway = InMemoryGateway::new();
    gateway.seed_job(sample_job(job_id)).await;
    gateway
}

#[tokio::test]
async fn dependencies_order_execution_and_pagination_drains() {
    let gateway = seeded_gateway("job_1").await;
    let log = Arc::new(Mutex::new(Vec::new()));

    // Declared out of order; `issues` must wait for `labels` to drain
    // all three of its pages.
    let steps: Vec<Arc<dyn Step>> = vec![
        Arc::new(RecordingStep {
            name: StepName::new("issues"),
            dependencies: vec![StepName::new("labels")],
            pages: 1,
            log: log.clone(),
        }),
        Arc::new(RecordingStep {
            name: StepName::new("labels"),
            dependencies: Vec::new(),
            pages: 3,
            log: log.clone(),
        }),
    ];

    let runner = Runner::new(Arc::new(gateway.clone()), steps);
    let outcome = runner.run(&JobId::new("job_1")).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["labels", "labels", "labels", "issues"]
    );

    let labels_metric = &outcome.steps[0];
    assert_eq!(labels_metric.pages, 3);
    assert_eq!(labels_metric.items, 30);

    let job_id = JobId::new("job_1");
    assert_eq!(gateway.get_job(&job_id).await.unwrap().status, JobStatus::Completed);
    assert!(gateway.get_import_report(&job_id).await.unwrap().end_time.is_some());
}

#[tokio::test]
async fn step_failure_marks_job_errored_without_end_time() {
    let gateway = seeded_gateway("job_1").await;
    let runner = Runner::new(Arc::new(gateway.clone()), vec![Arc::new(FailingStep)]);

    let err = runner.run(&JobId::new("job_1")).await.unwrap_err();
    assert!(matches!(err, EngineError::Step { .. }));
    assert_eq!(err.as_import_error().unwrap().code, "TOKEN_EXPIRED");

    let job_id = JobId::new("job_1");
    assert_eq!(gateway.get_job(&job_id).await.unwrap().status, JobStatus::Errored);
    // No end_time: the external scheduler sees an unfinished report.
    assert!(gateway.get_import_report(&job_id).await.unwrap().end_time.is_none());
}

#[tokio::test]
async fn cancellation_stops_between_pages() {
    let gateway = seeded_gateway("job_1").await;
    let steps: Vec<Arc<dyn Step>> = vec![Arc::new(SelfCancellingStep {
        gateway: gateway.clone(),
    })];

    let runner = Runner::new(Arc::new(gateway.clone()), steps);
    let outcome = runner.run(&JobId::new("job_1")).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Cancelled);
    // One page ran; the second was never requested.
    assert_eq!(outcome.context.page_ctx.processed, 10);
}

#[tokio::test]
async fn graph_errors_are_detected_before_any_step_runs() {
    let gateway = seeded_gateway("job_1").await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn Step>> = vec![Arc::new(RecordingStep {
        name: StepName::new("issues"),
        dependencies: vec![StepName::new("labels")],
        pages: 1,
        log: log.clone(),
    })];

    let runner = Runner::new(Arc::new(gateway.clone()), steps);
    let err = runner.run(&JobId::new("job_1")).await.unwrap_err();
    assert!(err.is_graph_error());
    assert!(log.lock().unwrap().is_empty());
    // The job never left its created state.
    assert_eq!(
        gateway.get_job(&JobId::new("job_1")).await.unwrap().status,
        JobStatus::Created
    );
}

#[tokio::test]
async fn rerun_after_completion_completes_again() {
    let gateway = seeded_gateway("job_1").await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn Step>> = vec![Arc::new(RecordingStep {
        name: StepName::new("labels"),
        dependencies: Vec::new(),
        pages: 2,
        log: log.clone(),
    })];

    let runner = Runner::new(Arc::new(gateway.clone()), steps);
    runner.run(&JobId::new("job_1")).await.unwrap();
    let outcome = runner.run(&JobId::new("job_1")).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(log.lock().unwrap().len(), 4);
}
