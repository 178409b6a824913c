//! Migrator runner: orders steps, drains pagination, and finalizes the
//! job.
//!
//! One runner executes one job. Steps run strictly sequentially in
//! dependency order (concurrency lives INSIDE a step, in the batch
//! executor); a step returning `has_more = true` is re-invoked with its
//! returned cursor until it drains. There is no retry at this layer:
//! a step error marks the job errored and propagates to the external
//! scheduler, leaving the report without an `end_time`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use caravel_gateway::JobGateway;
use caravel_types::job::{Job, JobId, JobStatus};

use crate::context::{PageContext, StepContext};
use crate::error::EngineError;
use crate::step::{Step, StepDescriptor, StepInput, StepName};

/// Per-step execution metrics, one entry per drained step.
#[derive(Debug, Clone)]
pub struct StepRunMetric {
    pub step: StepName,
    pub pages: u64,
    pub items: u64,
    pub duration_secs: f64,
}

/// Result of a finished (not failed) run.
#[derive(Debug)]
pub struct RunOutcome {
    /// `Completed`, or `Cancelled` when the job was aborted externally.
    pub status: JobStatus,
    /// Everything the steps accumulated, mostly useful to tests and the
    /// CLI summary.
    pub context: StepContext,
    pub steps: Vec<StepRunMetric>,
    pub duration_secs: f64,
}

/// Executes one job's step table against the gateway.
pub struct Runner {
    gateway: Arc<dyn JobGateway>,
    steps: Vec<Arc<dyn Step>>,
}

impl Runner {
    #[must_use]
    pub fn new(gateway: Arc<dyn JobGateway>, steps: Vec<Arc<dyn Step>>) -> Self {
        Self { gateway, steps }
    }

    /// Run the job to completion, cancellation, or first step error.
    ///
    /// # Errors
    ///
    /// Returns a graph error before any step runs if the step table has
    /// duplicate names, unknown dependencies, or a cycle;
    /// [`EngineError::Step`] when a step body fails; or
    /// [`EngineError::Infrastructure`] on gateway failures.
    pub async fn run(&self, job_id: &JobId) -> Result<RunOutcome, EngineError> {
        let start = Instant::now();

        let descriptors: Vec<StepDescriptor> =
            self.steps.iter().map(|s| StepDescriptor::of(s.as_ref())).collect();
        let order = resolve_order(&descriptors)?;

        let job = self.fetch_job(job_id).await?;
        tracing::info!(
            job = %job_id,
            source = job.source.as_str(),
            steps = self.steps.len(),
            "Starting import run"
        );

        self.set_status(job_id, JobStatus::Pulling).await?;

        let mut accumulated = StepContext::empty();
        let mut metrics = Vec::with_capacity(order.len());

        for idx in order {
            let step = &self.steps[idx];
            match self.drain_step(job_id, step.as_ref(), &mut accumulated).await {
                Ok(Some(metric)) => metrics.push(metric),
                Ok(None) => {
                    // Cancelled mid-step.
                    tracing::warn!(job = %job_id, step = %step.name(), "Job cancelled, stopping run");
                    self.set_status(job_id, JobStatus::Cancelled).await?;
                    return Ok(RunOutcome {
                        status: JobStatus::Cancelled,
                        context: accumulated,
                        steps: metrics,
                        duration_secs: start.elapsed().as_secs_f64(),
                    });
                }
                Err(err) => {
                    if let Err(status_err) =
                        self.gateway.update_job_status(job_id, JobStatus::Errored).await
                    {
                        tracing::error!(
                            job = %job_id,
                            "Failed to mark job errored: {status_err}"
                        );
                    }
                    return Err(err);
                }
            }
        }

        self.gateway
            .finalize_report(job_id)
            .await
            .context("finalizing import report")?;
        self.set_status(job_id, JobStatus::Completed).await?;

        let duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            job = %job_id,
            items = metrics.iter().map(|m| m.items).sum::<u64>(),
            duration_secs,
            "Import run completed"
        );

        Ok(RunOutcome {
            status: JobStatus::Completed,
            context: accumulated,
            steps: metrics,
            duration_secs,
        })
    }

    /// Drain one step's pagination loop. Returns `Ok(None)` when the job
    /// was cancelled externally.
    async fn drain_step(
        &self,
        job_id: &JobId,
        step: &dyn Step,
        accumulated: &mut StepContext,
    ) -> Result<Option<StepRunMetric>, EngineError> {
        let name = step.name();
        let step_start = Instant::now();
        let mut resume = PageContext::default();
        let mut pages = 0u64;
        let mut items = 0u64;

        loop {
            // Re-fetch so an external cancellation lands between pages.
            let job = self.fetch_job(job_id).await?;
            if job.is_cancelled() {
                return Ok(None);
            }

            let input = StepInput {
                job: Arc::new(job),
                resume,
                carry: Arc::new(accumulated.clone()),
            };
            let ctx = step
                .execute(input)
                .await
                .map_err(|e| EngineError::step(name, e))?;

            let page = ctx.page_ctx;
            pages += 1;
            items += page.processed;
            accumulated.merge(ctx);

            tracing::debug!(
                job = %job_id,
                step = %name,
                page = pages,
                cursor = page.cursor,
                processed = page.processed,
                has_more = page.has_more,
                "Step page drained"
            );

            if !page.has_more {
                break;
            }
            resume = PageContext {
                has_more: false,
                cursor: page.cursor,
                processed: 0,
            };
        }

        let duration_secs = step_start.elapsed().as_secs_f64();
        tracing::info!(job = %job_id, step = %name, pages, items, duration_secs, "Step completed");
        Ok(Some(StepRunMetric {
            step: name,
            pages,
            items,
            duration_secs,
        }))
    }

    async fn fetch_job(&self, job_id: &JobId) -> Result<Job, EngineError> {
        Ok(self
            .gateway
            .get_job(job_id)
            .await
            .context("fetching job from gateway")?)
    }

    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> Result<(), EngineError> {
        Ok(self
            .gateway
            .update_job_status(job_id, status)
            .await
            .with_context(|| format!("updating job status to {}", status.as_str()))?)
    }
}

/// Topologically order the step table.
///
/// Ties break on declaration order, so a table with no dependencies runs
/// exactly as written.
///
/// # Errors
///
/// Returns a graph [`EngineError`] on duplicate names, unknown
/// dependencies, or a cycle.
pub fn resolve_order(steps: &[StepDescriptor]) -> Result<Vec<usize>, EngineError> {
    let mut index_of: HashMap<StepName, usize> = HashMap::with_capacity(steps.len());
    for (i, desc) in steps.iter().enumerate() {
        if index_of.insert(desc.name, i).is_some() {
            return Err(EngineError::DuplicateStep(desc.name));
        }
    }

    let mut indegree = vec![0usize; steps.len()];
    for desc in steps {
        for dep in &desc.dependencies {
            if !index_of.contains_key(dep) {
                return Err(EngineError::UnknownDependency {
                    step: desc.name,
                    dependency: *dep,
                });
            }
            indegree[index_of[&desc.name]] += 1;
        }
    }

    // Kahn's algorithm; the ready scan walks declaration order, which is
    // the tie-break.
    let mut emitted = vec![false; steps.len()];
    let mut order = Vec::with_capacity(steps.len());
    while order.len() < steps.len() {
        let Some(next) = (0..steps.len()).find(|&i| !emitted[i] && indegree[i] == 0) else {
            let remaining = steps
                .iter()
                .enumerate()
                .filter(|(i, _)| !emitted[*i])
                .map(|(_, d)| d.name)
                .collect();
            return Err(EngineError::DependencyCycle { remaining });
        };
        emitted[next] = true;
        order.push(next);
        for (i, desc) in steps.iter().enumerate() {
            if !emitted[i] && desc.dependencies.contains(&steps[next].name) {
                indegree[i] -= 1;
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &'static str, deps: &[&'static str]) -> StepDescriptor {
        StepDescriptor {
            name: StepName::new(name),
            dependencies: deps.iter().map(|d| StepName::new(d)).collect(),
        }
    }

    #[test]
    fn independent_steps_keep_declaration_order() {
        let steps = vec![desc("labels", &[]), desc("pages", &[]), desc("users", &[])];
        assert_eq!(resolve_order(&steps).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dependencies_run_first() {
        let steps = vec![
            desc("issues", &["labels"]),
            desc("labels", &[]),
            desc("wait", &["issues"]),
        ];
        assert_eq!(resolve_order(&steps).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn diamond_breaks_ties_by_declaration() {
        let steps = vec![
            desc("root", &[]),
            desc("left", &["root"]),
            desc("right", &["root"]),
            desc("sink", &["left", "right"]),
        ];
        assert_eq!(resolve_order(&steps).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let steps = vec![desc("labels", &[]), desc("labels", &[])];
        assert!(matches!(
            resolve_order(&steps),
            Err(EngineError::DuplicateStep(_))
        ));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let steps = vec![desc("issues", &["labels"])];
        assert!(matches!(
            resolve_order(&steps),
            Err(EngineError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn cycle_is_rejected() {
        let steps = vec![desc("a", &["b"]), desc("b", &["a"])];
        let err = resolve_order(&steps).unwrap_err();
        assert!(matches!(err, EngineError::DependencyCycle { .. }));
    }
}
