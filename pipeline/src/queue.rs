//! In-process job queue.
//!
//! An unbounded channel gives at-least-once, in-order delivery to the worker
//! within this process. Dispatch never fails the caller: if the worker is
//! gone the job is logged and dropped, and the webhook handler still
//! acknowledges the provider.

use async_trait::async_trait;
use events::{JobDispatcher, PipelineJob};
use log::*;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<PipelineJob>,
}

impl JobQueue {
    /// Creates the queue and the receiving end the worker drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobDispatcher for JobQueue {
    async fn dispatch(&self, job: PipelineJob) {
        debug!(
            "Enqueueing {} job for meeting {}",
            job.job_name(),
            job.meeting_id()
        );
        if let Err(e) = self.sender.send(job) {
            error!("Pipeline queue is closed; dropping job: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn dispatched_jobs_arrive_in_order() {
        let (queue, mut receiver) = JobQueue::new();
        let meeting_id = Uuid::new_v4();

        queue
            .dispatch(PipelineJob::CallEnded {
                meeting_id,
                call_id: "c1".to_string(),
                duration_seconds: None,
                participants_count: None,
            })
            .await;
        queue
            .dispatch(PipelineJob::Summarize {
                meeting_id,
                transcript: "t".to_string(),
            })
            .await;

        assert_eq!(receiver.recv().await.unwrap().job_name(), "call_ended");
        assert_eq!(receiver.recv().await.unwrap().job_name(), "summarize");
    }

    #[tokio::test]
    async fn dispatch_after_receiver_drop_does_not_panic() {
        let (queue, receiver) = JobQueue::new();
        drop(receiver);

        queue
            .dispatch(PipelineJob::Summarize {
                meeting_id: Uuid::new_v4(),
                transcript: "t".to_string(),
            })
            .await;
    }
}
