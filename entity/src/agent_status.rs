use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of an AI agent persona.
#[derive(
    Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "agent_status")]
pub enum AgentStatus {
    /// Available for new meetings
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    /// Temporarily disabled by the owner
    #[sea_orm(string_value = "inactive")]
    Inactive,
    /// Retired; kept for historical meetings
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Active => write!(fmt, "active"),
            AgentStatus::Inactive => write!(fmt, "inactive"),
            AgentStatus::Archived => write!(fmt, "archived"),
        }
    }
}
