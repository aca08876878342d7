//! Pipeline job events for the Meet.ai backend.
//!
//! This crate defines the asynchronous jobs that drive post-call processing
//! and the dispatcher seam through which they are enqueued.
//!
//! # Architecture
//!
//! - **PipelineJob**: Enum of every background job the pipeline runs
//! - **JobDispatcher**: Trait for enqueueing jobs (in-process queue in this
//!   repository; the seam where a durable external job runner would plug in)
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies: the webhook layer, the domain layer, and
//! the pipeline worker all speak in these types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// One asynchronous, retryable unit of the post-call processing sequence.
///
/// `CallEnded`, `TranscriptionReady`, and `RecordingReady` are produced by
/// the webhook normalizer; `Summarize` is produced by the pipeline itself,
/// only after a transcript artifact has been persisted for the meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum PipelineJob {
    /// The provider reported the call session ended: transition the meeting
    /// into `processing` and record call metadata.
    CallEnded {
        meeting_id: Id,
        call_id: String,
        duration_seconds: Option<i32>,
        participants_count: Option<i32>,
    },
    /// A transcript is available, either inline or behind a URL: fetch,
    /// clean, persist, then trigger summarization.
    TranscriptionReady {
        meeting_id: Id,
        call_id: String,
        transcript: Option<String>,
        transcript_url: Option<String>,
    },
    /// A recording URL is available. Unordered relative to the transcript
    /// and summary jobs; never touches the meeting status.
    RecordingReady {
        meeting_id: Id,
        call_id: String,
        recording_url: String,
        format: Option<String>,
        size_bytes: Option<i64>,
        duration_seconds: Option<i64>,
    },
    /// Summarize a cleaned transcript and finalize the meeting.
    Summarize { meeting_id: Id, transcript: String },
}

impl PipelineJob {
    /// Stable job name, used for logging and the job ledger.
    pub fn job_name(&self) -> &'static str {
        match self {
            PipelineJob::CallEnded { .. } => "call_ended",
            PipelineJob::TranscriptionReady { .. } => "transcription_ready",
            PipelineJob::RecordingReady { .. } => "recording_ready",
            PipelineJob::Summarize { .. } => "summarize",
        }
    }

    /// The meeting this job operates on.
    pub fn meeting_id(&self) -> Id {
        match self {
            PipelineJob::CallEnded { meeting_id, .. }
            | PipelineJob::TranscriptionReady { meeting_id, .. }
            | PipelineJob::RecordingReady { meeting_id, .. }
            | PipelineJob::Summarize { meeting_id, .. } => *meeting_id,
        }
    }
}

/// Trait for enqueueing pipeline jobs.
///
/// Implementations must provide at-least-once delivery to the worker; the
/// worker's steps are idempotent, so duplicate delivery is safe. Dispatch
/// failures are the implementation's to log: callers (in particular the
/// webhook handler) must not fail their own request because a downstream
/// job could not be enqueued.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch(&self, job: PipelineJob);
}

/// Dispatcher that records jobs in memory instead of running them.
/// Used by tests asserting what a code path enqueued and in which order.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    jobs: Arc<Mutex<Vec<PipelineJob>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<PipelineJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: PipelineJob) {
        self.jobs.lock().unwrap().push(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_events_round_trip_through_serde() {
        let job = PipelineJob::CallEnded {
            meeting_id: Uuid::new_v4(),
            call_id: "abc123".to_string(),
            duration_seconds: Some(1800),
            participants_count: Some(4),
        };

        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"name\":\"call_ended\""));

        let parsed: PipelineJob = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, job);
    }

    #[tokio::test]
    async fn recording_dispatcher_preserves_dispatch_order() {
        let dispatcher = RecordingDispatcher::new();
        let meeting_id = Uuid::new_v4();

        dispatcher
            .dispatch(PipelineJob::Summarize {
                meeting_id,
                transcript: "first".to_string(),
            })
            .await;
        dispatcher
            .dispatch(PipelineJob::Summarize {
                meeting_id,
                transcript: "second".to_string(),
            })
            .await;

        let jobs = dispatcher.dispatched();
        assert_eq!(jobs.len(), 2);
        assert!(matches!(
            &jobs[0],
            PipelineJob::Summarize { transcript, .. } if transcript == "first"
        ));
    }
}
