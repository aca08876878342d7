//! Observable job-step records.
//!
//! Each job the worker picks up gets a record tracking its step name,
//! attempt count, last error, and final state. This makes retry behavior
//! inspectable by operators (via logs) and by tests (via snapshots) instead
//! of living implicitly inside the retry loop.

use events::PipelineJob;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Final disposition of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Currently executing (or awaiting a retry)
    Running,
    /// The step ran to completion (including idempotent no-op re-runs)
    Completed,
    /// A status precondition no longer held (e.g. meeting cancelled);
    /// the job stopped without retrying and without writing
    Abandoned,
    /// Fatal error or retries exhausted; the meeting keeps its last state
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub job_name: &'static str,
    pub meeting_id: Uuid,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub state: JobState,
}

#[derive(Default)]
pub struct JobLedger {
    records: Mutex<HashMap<Uuid, JobRecord>>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly received job and returns its ledger ID.
    pub fn begin(&self, job: &PipelineJob) -> Uuid {
        let job_id = Uuid::new_v4();
        let record = JobRecord {
            job_id,
            job_name: job.job_name(),
            meeting_id: job.meeting_id(),
            attempts: 0,
            last_error: None,
            state: JobState::Running,
        };
        self.records.lock().unwrap().insert(job_id, record);
        job_id
    }

    pub fn record_attempt(&self, job_id: Uuid) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&job_id) {
            record.attempts += 1;
        }
    }

    pub fn record_error(&self, job_id: Uuid, error: String) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&job_id) {
            record.last_error = Some(error);
        }
    }

    pub fn finish(&self, job_id: Uuid, state: JobState) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&job_id) {
            record.state = state;
        }
    }

    pub fn get(&self, job_id: Uuid) -> Option<JobRecord> {
        self.records.lock().unwrap().get(&job_id).cloned()
    }

    /// Current view of every job this worker has seen.
    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_and_errors_accumulate_per_job() {
        let ledger = JobLedger::new();
        let job = PipelineJob::Summarize {
            meeting_id: Uuid::new_v4(),
            transcript: "t".to_string(),
        };

        let job_id = ledger.begin(&job);
        ledger.record_attempt(job_id);
        ledger.record_error(job_id, "provider timeout".to_string());
        ledger.record_attempt(job_id);
        ledger.finish(job_id, JobState::Completed);

        let record = ledger.get(job_id).unwrap();
        assert_eq!(record.attempts, 2);
        assert_eq!(record.last_error.as_deref(), Some("provider timeout"));
        assert_eq!(record.state, JobState::Completed);
        assert_eq!(record.job_name, "summarize");
    }
}
