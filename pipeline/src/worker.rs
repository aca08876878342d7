//! Job worker with bounded retry and exponential backoff.

use crate::ledger::{JobLedger, JobState};
use crate::steps::{self, StepContext, StepError, StepOutcome};
use domain::gateway::llm::ChatProvider;
use events::{JobDispatcher, PipelineJob};
use log::*;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Exponential backoff retry policy.
///
/// Retries failed steps with exponentially increasing delays, capped at a
/// maximum. Exhausting the attempts leaves the meeting in its last
/// successful state, surfaced in the logs and the job ledger.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy with default delay settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum number of attempts per job
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Calculate exponential backoff delay after `n_past_attempts`.
    fn delay(&self, n_past_attempts: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * 2_f64.powi(n_past_attempts as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Tunables the worker carries beyond the retry policy.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub retry: RetryPolicy,
    /// Character budget per transcript chunk during summarization
    pub chunk_budget: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3),
            chunk_budget: 8000,
        }
    }
}

/// Drains the job queue, running each job's step with retry.
pub struct PipelineWorker {
    db: Arc<DatabaseConnection>,
    provider: Arc<dyn ChatProvider>,
    dispatcher: Arc<dyn JobDispatcher>,
    settings: WorkerSettings,
    ledger: Arc<JobLedger>,
}

impl PipelineWorker {
    pub fn new(
        db: Arc<DatabaseConnection>,
        provider: Arc<dyn ChatProvider>,
        dispatcher: Arc<dyn JobDispatcher>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            db,
            provider,
            dispatcher,
            settings,
            ledger: Arc::new(JobLedger::new()),
        }
    }

    /// The worker's job ledger, for operators and tests.
    pub fn ledger(&self) -> Arc<JobLedger> {
        Arc::clone(&self.ledger)
    }

    /// Drains the queue until it closes.
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<PipelineJob>) {
        info!("Pipeline worker started");
        while let Some(job) = receiver.recv().await {
            self.process(job).await;
        }
        info!("Pipeline queue closed; worker stopping");
    }

    /// Runs one job to a final ledger state.
    pub async fn process(&self, job: PipelineJob) {
        let job_id = self.ledger.begin(&job);
        let job_name = job.job_name();
        let meeting_id = job.meeting_id();

        debug!("Processing {job_name} job for meeting {meeting_id}");

        let ctx = StepContext {
            db: self.db.as_ref(),
            provider: self.provider.as_ref(),
            dispatcher: self.dispatcher.as_ref(),
            chunk_budget: self.settings.chunk_budget,
        };

        let max_attempts = self.settings.retry.max_attempts();
        for attempt in 1..=max_attempts {
            self.ledger.record_attempt(job_id);

            match steps::execute(&ctx, &job).await {
                Ok(StepOutcome::Completed) => {
                    self.ledger.finish(job_id, JobState::Completed);
                    return;
                }
                Ok(StepOutcome::NoOp) => {
                    debug!("{job_name} for meeting {meeting_id} was already done");
                    self.ledger.finish(job_id, JobState::Completed);
                    return;
                }
                Ok(StepOutcome::Abandoned) => {
                    self.ledger.finish(job_id, JobState::Abandoned);
                    return;
                }
                Err(StepError::Fatal(e)) => {
                    error!("{job_name} for meeting {meeting_id} failed fatally: {e}");
                    self.ledger.record_error(job_id, e.to_string());
                    self.ledger.finish(job_id, JobState::Failed);
                    return;
                }
                Err(StepError::Retryable(e)) => {
                    warn!(
                        "{job_name} for meeting {meeting_id} failed \
                         (attempt {attempt}/{max_attempts}): {e}"
                    );
                    self.ledger.record_error(job_id, e.to_string());
                    if attempt < max_attempts {
                        tokio::time::sleep(self.settings.retry.delay(attempt)).await;
                    }
                }
            }
        }

        error!(
            "{job_name} for meeting {meeting_id} exhausted {max_attempts} attempts; \
             meeting remains in its last successful state"
        );
        self.ledger.finish(job_id, JobState::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::new(3);

        assert_eq!(policy.delay(0).as_secs(), 1);
        assert_eq!(policy.delay(1).as_secs(), 2);
        assert_eq!(policy.delay(2).as_secs(), 4);
    }

    #[test]
    fn delay_is_capped_at_the_maximum() {
        let policy = RetryPolicy::new(10);
        assert!(policy.delay(10) <= policy.max_delay);
    }

    #[test]
    fn at_least_one_attempt_is_always_made() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::ledger::JobState;
    use async_trait::async_trait;
    use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind};
    use domain::gateway::llm::CompletionRequest;
    use events::RecordingDispatcher;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, DomainError> {
            Err(DomainError {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            })
        }

        fn provider_id(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn fatal_errors_do_not_consume_retries() {
        // find_by_id comes back empty → fatal, exactly one attempt recorded.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity_api::meetings::Model>::new()])
            .into_connection();

        let worker = PipelineWorker::new(
            Arc::new(db),
            Arc::new(FailingProvider),
            Arc::new(RecordingDispatcher::new()),
            WorkerSettings {
                retry: RetryPolicy::new(3),
                chunk_budget: 8000,
            },
        );
        let ledger = worker.ledger();

        worker
            .process(PipelineJob::Summarize {
                meeting_id: Uuid::new_v4(),
                transcript: "text".to_string(),
            })
            .await;

        let records = ledger.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempts, 1);
        assert_eq!(records[0].state, JobState::Failed);
        assert!(records[0].last_error.is_some());
    }
}
