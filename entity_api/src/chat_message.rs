//! Append-only chat message log for transcript chat.
//!
//! Messages are never updated or deleted individually; creation order is the
//! only guaranteed ordering.

use super::error::Error;
use entity::chat_messages::{ActiveModel, Column, Entity, Model};
use entity::chat_role::ChatRole;
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, QuerySelect,
    TryIntoModel,
};

/// Appends a message to a meeting's chat log
pub async fn create(
    db: &DatabaseConnection,
    meeting_id: Id,
    user_id: Option<Id>,
    role: ChatRole,
    content: String,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        meeting_id: Set(meeting_id),
        user_id: Set(user_id),
        role: Set(role),
        content: Set(content),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Returns a meeting's full chat log in creation order
pub async fn find_by_meeting(db: &DatabaseConnection, meeting_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Returns the most recent `limit` messages in creation order
pub async fn find_recent(
    db: &DatabaseConnection,
    meeting_id: Id,
    limit: u64,
) -> Result<Vec<Model>, Error> {
    let mut messages = Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;

    messages.reverse();
    Ok(messages)
}
