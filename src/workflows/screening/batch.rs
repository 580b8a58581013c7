use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::analyzer::ResumeAnalyzer;
use super::domain::{
    AnalysisRecord, BatchErrorKind, BatchOutcome, CandidateId, DocumentRef, ExtractionResult,
    JobContext,
};
use super::extraction::{DocumentStore, TextExtractor};
use super::model::ModelProvider;
use super::prompts::PromptStore;

/// One candidate's work item inside a batch run.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub candidate_id: CandidateId,
    pub extraction: ExtractionResult,
    pub document: DocumentRef,
}

/// Cooperative batch-level cancellation: once raised, no further items are
/// issued, while in-flight items finish or fail on their own.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fans the single-candidate pipeline out over many candidates under a hard
/// concurrency ceiling, isolating each item's failure.
pub struct BatchOrchestrator<P, S, D, E> {
    analyzer: Arc<ResumeAnalyzer<P, S, D, E>>,
}

impl<P, S, D, E> BatchOrchestrator<P, S, D, E>
where
    P: ModelProvider + Send + Sync + 'static,
    S: PromptStore + Send + Sync + 'static,
    D: DocumentStore + Send + Sync + 'static,
    E: TextExtractor + Send + Sync + 'static,
{
    pub fn new(analyzer: Arc<ResumeAnalyzer<P, S, D, E>>) -> Self {
        Self { analyzer }
    }

    pub async fn run_batch(
        &self,
        items: Vec<BatchItem>,
        job: Option<&JobContext>,
        max_concurrency: usize,
    ) -> BatchOutcome {
        self.run_batch_with_cancel(items, job, max_concurrency, &CancellationFlag::new())
            .await
    }

    /// Runs every item to success or isolated failure. At most
    /// `max_concurrency` analyses are in flight at any instant; the ceiling
    /// is enforced by a semaphore acquired before any work starts. Outcome
    /// lists preserve submission order regardless of completion order.
    pub async fn run_batch_with_cancel(
        &self,
        items: Vec<BatchItem>,
        job: Option<&JobContext>,
        max_concurrency: usize,
        cancel: &CancellationFlag,
    ) -> BatchOutcome {
        let total = items.len();
        if total == 0 {
            return BatchOutcome::empty();
        }

        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let job = job.cloned().map(Arc::new);
        let mut tasks: JoinSet<(usize, CandidateId, Result<AnalysisRecord, BatchErrorKind>)> =
            JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let job = job.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                // Permit acquisition is the issue point: the cancellation
                // check must happen after it so in-flight items are never
                // interrupted while unissued ones stop here.
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                if cancel.is_cancelled() {
                    return (index, item.candidate_id, Err(BatchErrorKind::Cancelled));
                }

                let result = analyzer
                    .analyze(&item.extraction, &item.document, job.as_deref())
                    .await;
                match result {
                    Ok(record) => (index, item.candidate_id, Ok(record)),
                    Err(error) => {
                        tracing::warn!(
                            candidate = %item.candidate_id.0,
                            %error,
                            "batch item failed"
                        );
                        (index, item.candidate_id, Err(error.batch_kind()))
                    }
                }
            });
        }

        let mut completed = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => completed.push(entry),
                Err(join_error) => {
                    tracing::error!(%join_error, "batch task aborted unexpectedly");
                }
            }
        }
        completed.sort_by_key(|(index, _, _)| *index);

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (_, candidate_id, result) in completed {
            match result {
                Ok(record) => succeeded.push((candidate_id, record)),
                Err(kind) => failed.push((candidate_id, kind)),
            }
        }

        let success_rate = succeeded.len() as f64 / total as f64;
        tracing::info!(
            total,
            succeeded = succeeded.len(),
            failed = failed.len(),
            success_rate,
            "batch analysis completed"
        );

        BatchOutcome {
            succeeded,
            failed,
            success_rate,
        }
    }
}
