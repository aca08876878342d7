//! SeaORM Entity for the meetings table.
//! The central record tracked through the meeting lifecycle state machine.

use crate::meeting_status::MeetingStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::meetings::Model)]
#[sea_orm(schema_name = "meetai", table_name = "meetings")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    /// Owning user
    #[schema(value_type = Uuid)]
    pub user_id: Id,

    /// Assigned AI agent; a meeting always has one
    #[schema(value_type = Uuid)]
    pub agent_id: Id,

    pub name: String,

    /// Video-provider call identifier; set once a call has been created
    pub call_id: Option<String>,

    /// Current lifecycle status
    pub status: MeetingStatus,

    /// Set when the meeting enters `active`
    #[schema(value_type = Option<String>, format = DateTime)]
    pub started_at: Option<DateTimeWithTimeZone>,

    /// Set when the meeting enters `processing` or `cancelled`
    #[schema(value_type = Option<String>, format = DateTime)]
    pub ended_at: Option<DateTimeWithTimeZone>,

    /// Call duration as reported by the video provider
    pub duration_seconds: Option<i32>,

    pub participants_count: Option<i32>,

    /// URL to the call recording (delivered by webhook)
    pub recording_url: Option<String>,

    /// Serialized transcript artifact JSON; written by the pipeline,
    /// replaced wholesale, never appended to
    #[sea_orm(column_type = "Text")]
    pub transcript: Option<String>,

    /// Serialized summary artifact JSON; written by the pipeline's final step
    #[sea_orm(column_type = "Text")]
    pub summary: Option<String>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agents::Entity",
        from = "Column::AgentId",
        to = "super::agents::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Agents,

    #[sea_orm(has_many = "super::chat_messages::Entity")]
    ChatMessages,
}

impl Related<super::agents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agents.def()
    }
}

impl Related<super::chat_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
