//! Per-item fault guard.
//!
//! Destination APIs reject individual items for reasons that should
//! never sink a whole page: a malformed date, a name collision, a
//! transient 429. [`protect`] turns those into a logged `None` so the
//! batch executor simply drops the item and moves on.

use std::future::Future;

use caravel_types::error::ImportError;
use caravel_types::entity::EntityKind;
use caravel_types::job::JobId;

/// Await `fut`; on error, log one line with job/entity context and
/// return `None`. Success passes through silently.
pub async fn protect<T, Fut>(job: &JobId, kind: EntityKind, fut: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, ImportError>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(
                job = %job,
                entity = %kind,
                category = %err.category,
                code = %err.code,
                "Item failed, dropping from batch: {}",
                err.message
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_through() {
        let job = JobId::new("job_1");
        let out = protect(&job, EntityKind::Label, async { Ok::<_, ImportError>(7) }).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn error_becomes_none() {
        let job = JobId::new("job_1");
        let out = protect::<u32, _>(&job, EntityKind::Issue, async {
            Err(ImportError::data("BAD_DATE", "unparseable due date"))
        })
        .await;
        assert_eq!(out, None);
    }
}
