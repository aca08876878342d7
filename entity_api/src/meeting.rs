//! CRUD and guarded lifecycle transitions for the meetings table.
//!
//! Every status transition is a single conditional UPDATE filtered on the
//! expected current status. A transition that matched zero rows is reported
//! to the caller (`Ok(false)`) instead of being applied blindly, so racing
//! writers (e.g. a recording-ready job and a cancel action) can never
//! resurrect a meeting or clobber each other's fields.

use super::error::{EntityApiErrorKind, Error};
use entity::meeting_status::MeetingStatus;
use entity::meetings::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    sea_query::Expr,
    ActiveEnum,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, QueryOrder, TryIntoModel,
};

fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

/// Creates a new meeting in the `upcoming` state.
pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    debug!(
        "Creating new meeting \"{}\" for user: {}",
        model.name, model.user_id
    );

    let timestamp = now();

    let active_model = ActiveModel {
        user_id: Set(model.user_id),
        agent_id: Set(model.agent_id),
        name: Set(model.name),
        call_id: Set(model.call_id),
        status: Set(MeetingStatus::Upcoming),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Finds a meeting by ID
pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Finds a meeting by ID, scoped to its owner
pub async fn find_by_id_and_user(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })
}

/// Finds a meeting by the video provider's call ID
pub async fn find_by_call_id(
    db: &DatabaseConnection,
    call_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::CallId.eq(call_id))
        .one(db)
        .await?)
}

/// Lists a user's meetings, newest first, optionally filtered by status,
/// agent, and a name substring.
pub async fn find_by_user(
    db: &DatabaseConnection,
    user_id: Id,
    status: Option<MeetingStatus>,
    agent_id: Option<Id>,
    name_like: Option<String>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::UserId.eq(user_id));

    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status));
    }
    if let Some(agent_id) = agent_id {
        query = query.filter(Column::AgentId.eq(agent_id));
    }
    if let Some(name) = name_like {
        query = query.filter(Column::Name.contains(&name));
    }

    Ok(query.order_by_desc(Column::CreatedAt).all(db).await?)
}

/// Counts meetings assigned to an agent for a given owner
pub async fn count_by_agent(
    db: &DatabaseConnection,
    agent_id: Id,
    user_id: Id,
) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::AgentId.eq(agent_id))
        .filter(Column::UserId.eq(user_id))
        .count(db)
        .await?)
}

/// Updates the user-editable fields of a meeting (name, assigned agent)
pub async fn update(db: &DatabaseConnection, id: Id, model: Model) -> Result<Model, Error> {
    let result = Entity::find_by_id(id).one(db).await?;

    match result {
        Some(existing) => {
            debug!("Updating meeting: {id}");

            let active_model = ActiveModel {
                id: Unchanged(existing.id),
                user_id: Unchanged(existing.user_id),
                agent_id: Set(model.agent_id),
                name: Set(model.name),
                call_id: Unchanged(existing.call_id),
                status: Unchanged(existing.status),
                started_at: Unchanged(existing.started_at),
                ended_at: Unchanged(existing.ended_at),
                duration_seconds: Unchanged(existing.duration_seconds),
                participants_count: Unchanged(existing.participants_count),
                recording_url: Unchanged(existing.recording_url),
                transcript: Unchanged(existing.transcript),
                summary: Unchanged(existing.summary),
                created_at: Unchanged(existing.created_at),
                updated_at: Set(now()),
            };

            Ok(active_model.update(db).await?.try_into_model()?)
        }
        None => Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }),
    }
}

/// Deletes a meeting by ID. Terminal-state policy is enforced by the caller
/// before any mutation is attempted.
pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    let model = find_by_id(db, id).await?;
    Entity::delete_by_id(model.id).exec(db).await?;
    Ok(())
}

/// `upcoming → active` for a user-initiated start: records the freshly
/// created provider call ID and the start timestamp in one statement.
pub async fn start_with_call(
    db: &DatabaseConnection,
    id: Id,
    call_id: &str,
) -> Result<bool, Error> {
    let timestamp = now();
    let result = Entity::update_many()
        .col_expr(Column::Status, MeetingStatus::Active.as_enum())
        .col_expr(Column::CallId, Expr::value(call_id))
        .col_expr(Column::StartedAt, Expr::value(timestamp))
        .col_expr(Column::UpdatedAt, Expr::value(timestamp))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(MeetingStatus::Upcoming))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// `upcoming → active` for a call-started webhook, matched by call ID alone.
pub async fn start_by_call_id(db: &DatabaseConnection, call_id: &str) -> Result<bool, Error> {
    let timestamp = now();
    let result = Entity::update_many()
        .col_expr(Column::Status, MeetingStatus::Active.as_enum())
        .col_expr(Column::StartedAt, Expr::value(timestamp))
        .col_expr(Column::UpdatedAt, Expr::value(timestamp))
        .filter(Column::CallId.eq(call_id))
        .filter(Column::Status.eq(MeetingStatus::Upcoming))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// `active → processing`: records the end timestamp and, when known, the
/// call metadata reported by the provider.
pub async fn begin_processing(
    db: &DatabaseConnection,
    id: Id,
    duration_seconds: Option<i32>,
    participants_count: Option<i32>,
) -> Result<bool, Error> {
    let timestamp = now();
    let mut update = Entity::update_many()
        .col_expr(Column::Status, MeetingStatus::Processing.as_enum())
        .col_expr(Column::EndedAt, Expr::value(timestamp))
        .col_expr(Column::UpdatedAt, Expr::value(timestamp));

    if duration_seconds.is_some() {
        update = update.col_expr(Column::DurationSeconds, Expr::value(duration_seconds));
    }
    if participants_count.is_some() {
        update = update.col_expr(Column::ParticipantsCount, Expr::value(participants_count));
    }

    let result = update
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(MeetingStatus::Active))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// `upcoming|active → cancelled`. Records the end timestamp.
pub async fn cancel(db: &DatabaseConnection, id: Id) -> Result<bool, Error> {
    let timestamp = now();
    let result = Entity::update_many()
        .col_expr(Column::Status, MeetingStatus::Cancelled.as_enum())
        .col_expr(Column::EndedAt, Expr::value(timestamp))
        .col_expr(Column::UpdatedAt, Expr::value(timestamp))
        .filter(Column::Id.eq(id))
        .filter(
            Column::Status
                .eq(MeetingStatus::Upcoming)
                .or(Column::Status.eq(MeetingStatus::Active)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Replaces the stored transcript artifact. Only meetings that have reached
/// `processing` may carry a transcript; a cancelled meeting is left alone.
pub async fn set_transcript(
    db: &DatabaseConnection,
    id: Id,
    transcript_json: String,
) -> Result<bool, Error> {
    let result = Entity::update_many()
        .col_expr(Column::Transcript, Expr::value(transcript_json))
        .col_expr(Column::UpdatedAt, Expr::value(now()))
        .filter(Column::Id.eq(id))
        .filter(
            Column::Status
                .eq(MeetingStatus::Processing)
                .or(Column::Status.eq(MeetingStatus::Completed)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Targeted `recording_url` write. Independent of pipeline ordering, so the
/// only guard is that a cancelled meeting is never touched.
pub async fn set_recording_url(
    db: &DatabaseConnection,
    id: Id,
    recording_url: String,
) -> Result<bool, Error> {
    let result = Entity::update_many()
        .col_expr(Column::RecordingUrl, Expr::value(recording_url))
        .col_expr(Column::UpdatedAt, Expr::value(now()))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.ne(MeetingStatus::Cancelled))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// `processing → completed`, persisting the summary artifact in the same
/// statement so a meeting can never be completed without one.
pub async fn complete_with_summary(
    db: &DatabaseConnection,
    id: Id,
    summary_json: String,
) -> Result<bool, Error> {
    let timestamp = now();
    let result = Entity::update_many()
        .col_expr(Column::Status, MeetingStatus::Completed.as_enum())
        .col_expr(Column::Summary, Expr::value(summary_json))
        .col_expr(Column::UpdatedAt, Expr::value(timestamp))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(MeetingStatus::Processing))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}
