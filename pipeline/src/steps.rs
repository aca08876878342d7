//! Pipeline step implementations.
//!
//! Each job maps to one step body. Steps are idempotent: transcript and
//! summary writes replace rather than append, and transitions already
//! applied report as no-ops. Every status-sensitive write re-checks the
//! meeting's state through the guarded update itself, so a cancellation
//! racing a job is observed before the final write and the step abandons
//! rather than resurrecting the meeting.

use domain::error::Error as DomainError;
use domain::gateway::llm::ChatProvider;
use domain::meeting_status::MeetingStatus;
use domain::summary::SummaryEngine;
use domain::transcript::{
    clean_transcript, fetch_transcript_from_url, TranscriptArtifact, TRANSCRIPT_FETCH_FAILED,
    TRANSCRIPT_UNAVAILABLE,
};
use domain::Id;
use entity_api::error::EntityApiErrorKind;
use entity_api::meeting as meeting_api;
use events::{JobDispatcher, PipelineJob};
use log::*;
use sea_orm::DatabaseConnection;

/// Everything a step needs to run.
pub struct StepContext<'a> {
    pub db: &'a DatabaseConnection,
    pub provider: &'a dyn ChatProvider,
    pub dispatcher: &'a dyn JobDispatcher,
    pub chunk_budget: usize,
}

/// How a step finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work
    Completed,
    /// The work had already been done (idempotent re-delivery)
    NoOp,
    /// A status precondition no longer held; no write was made
    Abandoned,
}

/// Why a step failed.
#[derive(Debug)]
pub enum StepError {
    /// Retrying cannot help (e.g. the meeting does not exist)
    Fatal(DomainError),
    /// Transient failure; the orchestrator may retry
    Retryable(DomainError),
}

fn retryable(err: entity_api::error::Error) -> StepError {
    StepError::Retryable(err.into())
}

/// A missing meeting row is fatal; no retry will create it.
fn classify_lookup(err: entity_api::error::Error) -> StepError {
    if err.error_kind == EntityApiErrorKind::RecordNotFound {
        StepError::Fatal(err.into())
    } else {
        StepError::Retryable(err.into())
    }
}

/// Runs the step for a job.
pub async fn execute(ctx: &StepContext<'_>, job: &PipelineJob) -> Result<StepOutcome, StepError> {
    match job {
        PipelineJob::CallEnded {
            meeting_id,
            duration_seconds,
            participants_count,
            ..
        } => ingest_call_ended(ctx, *meeting_id, *duration_seconds, *participants_count).await,
        PipelineJob::TranscriptionReady {
            meeting_id,
            transcript,
            transcript_url,
            ..
        } => {
            process_transcription(
                ctx,
                *meeting_id,
                transcript.as_deref(),
                transcript_url.as_deref(),
            )
            .await
        }
        PipelineJob::RecordingReady {
            meeting_id,
            recording_url,
            ..
        } => save_recording(ctx, *meeting_id, recording_url).await,
        PipelineJob::Summarize {
            meeting_id,
            transcript,
        } => summarize(ctx, *meeting_id, transcript).await,
    }
}

/// Ingest step: `active → processing`, recording call metadata.
async fn ingest_call_ended(
    ctx: &StepContext<'_>,
    meeting_id: Id,
    duration_seconds: Option<i32>,
    participants_count: Option<i32>,
) -> Result<StepOutcome, StepError> {
    let transitioned =
        meeting_api::begin_processing(ctx.db, meeting_id, duration_seconds, participants_count)
            .await
            .map_err(retryable)?;

    if transitioned {
        info!("Meeting {meeting_id} → processing");
        return Ok(StepOutcome::Completed);
    }

    // Zero rows: find out why before deciding what this means.
    let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
        .await
        .map_err(classify_lookup)?;

    match meeting.status {
        MeetingStatus::Processing | MeetingStatus::Completed => {
            debug!("Meeting {meeting_id} already past ingest; nothing to do");
            Ok(StepOutcome::NoOp)
        }
        MeetingStatus::Cancelled => {
            warn!("Meeting {meeting_id} was cancelled; abandoning ingest");
            Ok(StepOutcome::Abandoned)
        }
        MeetingStatus::Upcoming => {
            warn!("Call ended for meeting {meeting_id} that never became active");
            Ok(StepOutcome::NoOp)
        }
        MeetingStatus::Active => {
            // The row was active when we read it but not when we wrote;
            // another writer is interleaving. Worth another attempt.
            Err(StepError::Retryable(DomainError::invalid()))
        }
    }
}

/// Transcription step: ensure `processing`, fetch/clean/persist the
/// transcript artifact, then (and only then) trigger summarization.
async fn process_transcription(
    ctx: &StepContext<'_>,
    meeting_id: Id,
    inline_transcript: Option<&str>,
    transcript_url: Option<&str>,
) -> Result<StepOutcome, StepError> {
    let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
        .await
        .map_err(classify_lookup)?;

    match meeting.status {
        MeetingStatus::Cancelled => {
            warn!("Meeting {meeting_id} was cancelled; abandoning transcription");
            return Ok(StepOutcome::Abandoned);
        }
        MeetingStatus::Upcoming => {
            warn!("Transcription arrived for meeting {meeting_id} that never became active");
            return Ok(StepOutcome::Abandoned);
        }
        MeetingStatus::Active => {
            // This job won the race with ingest; perform the transition
            // itself so the transcript never attaches to an active meeting.
            meeting_api::begin_processing(ctx.db, meeting_id, None, None)
                .await
                .map_err(retryable)?;
        }
        MeetingStatus::Processing | MeetingStatus::Completed => {}
    }

    let raw_transcript = match inline_transcript {
        Some(text) => text.to_string(),
        None => match transcript_url {
            Some(url) => match fetch_transcript_from_url(url).await {
                Ok(text) => text,
                Err(e) => {
                    // A degraded transcript beats a stuck meeting.
                    warn!("Transcript fetch failed for meeting {meeting_id}: {e}");
                    TRANSCRIPT_FETCH_FAILED.to_string()
                }
            },
            None => TRANSCRIPT_UNAVAILABLE.to_string(),
        },
    };

    let cleaned = clean_transcript(&raw_transcript);
    let artifact = TranscriptArtifact::new(raw_transcript, cleaned.clone());
    let artifact_json = serde_json::to_string(&artifact)
        .map_err(|e| StepError::Retryable(DomainError::from(e)))?;

    let stored = meeting_api::set_transcript(ctx.db, meeting_id, artifact_json)
        .await
        .map_err(retryable)?;

    if !stored {
        let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
            .await
            .map_err(classify_lookup)?;
        if meeting.status == MeetingStatus::Cancelled {
            warn!("Meeting {meeting_id} was cancelled; transcript not stored");
            return Ok(StepOutcome::Abandoned);
        }
        return Err(StepError::Retryable(DomainError::invalid()));
    }

    info!(
        "Stored transcript for meeting {meeting_id} ({} chars cleaned)",
        artifact.char_count
    );

    // Summarization is enqueued only after the transcript is persisted.
    ctx.dispatcher
        .dispatch(PipelineJob::Summarize {
            meeting_id,
            transcript: cleaned,
        })
        .await;

    Ok(StepOutcome::Completed)
}

/// Recording step: targeted `recording_url` write, unordered relative to the
/// transcript and summary jobs.
async fn save_recording(
    ctx: &StepContext<'_>,
    meeting_id: Id,
    recording_url: &str,
) -> Result<StepOutcome, StepError> {
    let stored = meeting_api::set_recording_url(ctx.db, meeting_id, recording_url.to_string())
        .await
        .map_err(retryable)?;

    if stored {
        info!("Stored recording URL for meeting {meeting_id}");
        return Ok(StepOutcome::Completed);
    }

    let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
        .await
        .map_err(classify_lookup)?;

    if meeting.status == MeetingStatus::Cancelled {
        warn!("Meeting {meeting_id} was cancelled; recording URL not stored");
        Ok(StepOutcome::Abandoned)
    } else {
        Err(StepError::Retryable(DomainError::invalid()))
    }
}

/// Summarize step: run the engine and finalize `processing → completed`.
/// Unparseable model output degrades but still completes; transport errors
/// propagate as retryable so the meeting stays in `processing`.
async fn summarize(
    ctx: &StepContext<'_>,
    meeting_id: Id,
    transcript: &str,
) -> Result<StepOutcome, StepError> {
    let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
        .await
        .map_err(classify_lookup)?;

    match meeting.status {
        MeetingStatus::Cancelled => {
            warn!("Meeting {meeting_id} was cancelled; abandoning summarization");
            return Ok(StepOutcome::Abandoned);
        }
        MeetingStatus::Completed => {
            debug!("Meeting {meeting_id} already completed; nothing to summarize");
            return Ok(StepOutcome::NoOp);
        }
        MeetingStatus::Upcoming | MeetingStatus::Active => {
            warn!(
                "Summarize arrived for meeting {meeting_id} in status {}; abandoning",
                meeting.status
            );
            return Ok(StepOutcome::Abandoned);
        }
        MeetingStatus::Processing => {}
    }

    let engine = SummaryEngine::new(ctx.provider, ctx.chunk_budget);
    let artifact = engine
        .summarize(transcript)
        .await
        .map_err(StepError::Retryable)?;

    let artifact_json = serde_json::to_string(&artifact)
        .map_err(|e| StepError::Retryable(DomainError::from(e)))?;

    let completed = meeting_api::complete_with_summary(ctx.db, meeting_id, artifact_json)
        .await
        .map_err(retryable)?;

    if !completed {
        let meeting = meeting_api::find_by_id(ctx.db, meeting_id)
            .await
            .map_err(classify_lookup)?;
        return match meeting.status {
            MeetingStatus::Cancelled => {
                warn!("Meeting {meeting_id} was cancelled; summary not stored");
                Ok(StepOutcome::Abandoned)
            }
            MeetingStatus::Completed => Ok(StepOutcome::NoOp),
            _ => Err(StepError::Retryable(DomainError::invalid())),
        };
    }

    info!("Meeting {meeting_id} → completed");
    Ok(StepOutcome::Completed)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind};
    use domain::gateway::llm::CompletionRequest;
    use entity_api::meetings;
    use events::RecordingDispatcher;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    struct CannedProvider {
        response: Result<String, ()>,
    }

    #[async_trait]
    impl ChatProvider for CannedProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, DomainError> {
            match &self.response {
                Ok(content) => Ok(content.clone()),
                Err(_) => Err(DomainError {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }),
            }
        }

        fn provider_id(&self) -> &str {
            "canned"
        }
    }

    fn meeting_in(status: MeetingStatus) -> meetings::Model {
        let now = Utc::now().into();
        meetings::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            name: "Weekly sync".to_string(),
            call_id: Some("abc123".to_string()),
            status,
            started_at: Some(now),
            ended_at: None,
            duration_seconds: None,
            participants_count: None,
            recording_url: None,
            transcript: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn transcription_persists_before_dispatching_summarize() {
        let meeting = meeting_in(MeetingStatus::Processing);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .append_exec_results([exec(1)])
            .into_connection();

        let provider = CannedProvider {
            response: Ok(String::new()),
        };
        let dispatcher = RecordingDispatcher::new();
        let ctx = StepContext {
            db: &db,
            provider: &provider,
            dispatcher: &dispatcher,
            chunk_budget: 8000,
        };

        let outcome = process_transcription(
            &ctx,
            meeting_id,
            Some("Um, so basically we agreed."),
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome, StepOutcome::Completed);

        let dispatched = dispatcher.dispatched();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(
            dispatched[0],
            PipelineJob::Summarize {
                meeting_id,
                transcript: "we agreed.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn transcription_abandons_cancelled_meetings_without_dispatching() {
        let meeting = meeting_in(MeetingStatus::Cancelled);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .into_connection();

        let provider = CannedProvider {
            response: Ok(String::new()),
        };
        let dispatcher = RecordingDispatcher::new();
        let ctx = StepContext {
            db: &db,
            provider: &provider,
            dispatcher: &dispatcher,
            chunk_budget: 8000,
        };

        let outcome = process_transcription(&ctx, meeting_id, Some("text."), None)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Abandoned);
        assert!(dispatcher.dispatched().is_empty());
    }

    #[tokio::test]
    async fn summarize_degrades_on_bad_model_output_but_still_completes() {
        let meeting = meeting_in(MeetingStatus::Processing);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .append_exec_results([exec(1)])
            .into_connection();

        let provider = CannedProvider {
            response: Ok("definitely not json".to_string()),
        };
        let dispatcher = RecordingDispatcher::new();
        let ctx = StepContext {
            db: &db,
            provider: &provider,
            dispatcher: &dispatcher,
            chunk_budget: 8000,
        };

        let outcome = summarize(&ctx, meeting_id, "A short meeting.").await.unwrap();
        assert_eq!(outcome, StepOutcome::Completed);
    }

    #[tokio::test]
    async fn summarize_transport_failure_is_retryable_and_writes_nothing() {
        let meeting = meeting_in(MeetingStatus::Processing);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .into_connection();

        let provider = CannedProvider { response: Err(()) };
        let dispatcher = RecordingDispatcher::new();
        let ctx = StepContext {
            db: &db,
            provider: &provider,
            dispatcher: &dispatcher,
            chunk_budget: 8000,
        };

        let result = summarize(&ctx, meeting_id, "A short meeting.").await;
        assert!(matches!(result, Err(StepError::Retryable(_))));
    }

    #[tokio::test]
    async fn ingest_is_an_idempotent_noop_once_processing() {
        let meeting = meeting_in(MeetingStatus::Processing);
        let meeting_id = meeting.id;

        // Guarded update matches zero rows, follow-up read sees processing.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .append_query_results([[meeting]])
            .into_connection();

        let provider = CannedProvider {
            response: Ok(String::new()),
        };
        let dispatcher = RecordingDispatcher::new();
        let ctx = StepContext {
            db: &db,
            provider: &provider,
            dispatcher: &dispatcher,
            chunk_budget: 8000,
        };

        let outcome = ingest_call_ended(&ctx, meeting_id, Some(120), Some(2))
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::NoOp);
    }
}
