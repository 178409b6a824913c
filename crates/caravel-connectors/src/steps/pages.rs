//! Pages step, for sources with a documents/wiki concept.

use std::sync::Arc;

use async_trait::async_trait;
use caravel_engine::batch::run_batch;
use caravel_engine::client::{DestinationClient, SourceClient, SourcePage};
use caravel_engine::context::{PageContext, StepContext};
use caravel_engine::guard::protect;
use caravel_engine::scope::with_log;
use caravel_engine::step::{Step, StepInput, StepName};
use caravel_types::entity::{EntityKind, EntityRef, PagePayload};
use caravel_types::error::ImportError;

use super::DEST_CONCURRENCY;

pub const PAGES_STEP: StepName = StepName::new("pages");

/// Pull a page of documents and create-or-skip them downstream.
pub struct PagesStep {
    source: Arc<dyn SourceClient>,
    destination: Arc<dyn DestinationClient>,
    page_size: u64,
}

impl PagesStep {
    #[must_use]
    pub fn new(
        source: Arc<dyn SourceClient>,
        destination: Arc<dyn DestinationClient>,
        page_size: u64,
    ) -> Self {
        Self {
            source,
            destination,
            page_size,
        }
    }
}

#[async_trait]
impl Step for PagesStep {
    fn name(&self) -> StepName {
        PAGES_STEP
    }

    async fn execute(&self, input: StepInput) -> Result<StepContext, ImportError> {
        let page = with_log(
            PAGES_STEP.as_str(),
            "pull",
            |p: &SourcePage<PagePayload>| Some(p.items.len()),
            self.source
                .fetch_pages(&input.job, input.resume.cursor, self.page_size),
        )
        .await?;

        let fetched = page.items.len() as u64;
        let job = input.job.clone();
        let destination = self.destination.clone();

        let refs = run_batch(page.items, DEST_CONCURRENCY, move |doc| {
            let job = job.clone();
            let destination = destination.clone();
            async move {
                let outcome = protect(
                    &job.id,
                    EntityKind::Page,
                    destination.create_page(&job, &doc),
                )
                .await?;
                Some(EntityRef {
                    external_id: doc.external_id,
                    destination_id: outcome.destination_id().to_owned(),
                })
            }
        })
        .await;

        tracing::info!(
            job = %input.job.id,
            fetched,
            loaded = refs.len(),
            "Document page loaded"
        );

        Ok(StepContext {
            pages: Some(refs),
            page_ctx: PageContext {
                has_more: page.has_more,
                cursor: page.cursor,
                processed: fetched,
            },
            ..StepContext::empty()
        })
    }
}
