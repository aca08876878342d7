use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of a meeting through its lifecycle.
///
/// Transitions are enforced by `entity_api::meeting` via guarded updates:
/// `upcoming → active → processing → completed`, with `cancelled` reachable
/// only from `upcoming` or `active`. `completed` and `cancelled` are terminal.
#[derive(
    Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "meeting_status")]
pub enum MeetingStatus {
    /// Scheduled but no call has started yet
    #[sea_orm(string_value = "upcoming")]
    #[default]
    Upcoming,
    /// Call is live
    #[sea_orm(string_value = "active")]
    Active,
    /// Call ended, post-call pipeline is running
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Transcript and summary are available
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled by the owner before completion
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl MeetingStatus {
    /// Whether a meeting in this status may be deleted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::Cancelled)
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Upcoming => write!(fmt, "upcoming"),
            MeetingStatus::Active => write!(fmt, "active"),
            MeetingStatus::Processing => write!(fmt, "processing"),
            MeetingStatus::Completed => write!(fmt, "completed"),
            MeetingStatus::Cancelled => write!(fmt, "cancelled"),
        }
    }
}
