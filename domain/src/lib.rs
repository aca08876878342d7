//! Business logic for the Meet.ai backend.
//!
//! This crate owns the meeting lifecycle state machine, webhook payload
//! normalization, transcript cleaning, AI summarization, and transcript
//! chat. Persistence details stay in `entity_api`; the items below are
//! re-exported so consumers of `domain` do not need to depend on the
//! entity layer directly.

pub use entity_api::{agents, chat_messages, meetings, Id};

pub use entity::{agent_status, chat_role, meeting_status};

pub mod agent;
pub mod chat;
pub mod error;
pub mod meeting;
pub mod summary;
pub mod transcript;
pub mod webhook;

pub mod gateway;
