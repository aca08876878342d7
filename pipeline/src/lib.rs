//! Background post-call pipeline.
//!
//! The webhook layer enqueues [`events::PipelineJob`]s through the
//! [`queue::JobQueue`]; the [`worker::PipelineWorker`] drains them, running
//! each job's step with bounded retry and exponential backoff. Every attempt
//! is recorded in the observable [`ledger::JobLedger`] so retry state is
//! explicit rather than an implicit framework behavior.

pub mod ledger;
pub mod queue;
pub mod steps;
pub mod worker;

pub use ledger::{JobLedger, JobRecord, JobState};
pub use queue::JobQueue;
pub use worker::{PipelineWorker, RetryPolicy, WorkerSettings};
