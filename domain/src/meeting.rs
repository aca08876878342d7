//! Meeting lifecycle operations.
//!
//! User-initiated actions are ownership-checked against the acting user;
//! webhook-driven transitions are matched by call ID alone (the provider is
//! trusted once its signature verified). All status transitions go through
//! `entity_api::meeting`'s guarded conditional updates, so an action
//! attempted from a state that does not permit it reports failure instead of
//! silently succeeding.

use crate::agent_status::AgentStatus;
use crate::error::Error;
use crate::gateway::stream_video::StreamVideoClient;
use crate::meeting_status::MeetingStatus;
use crate::meetings::Model;
use crate::summary::SummaryArtifact;
use crate::transcript::TranscriptArtifact;
use crate::Id;
use entity_api::{agent as agent_api, meeting as meeting_api};
use log::*;
use sea_orm::DatabaseConnection;

/// Filters for listing meetings
#[derive(Debug, Default, Clone)]
pub struct MeetingFilter {
    pub status: Option<MeetingStatus>,
    pub agent_id: Option<Id>,
    pub name: Option<String>,
}

/// Creates a meeting in the `upcoming` state. The assigned agent must
/// exist, belong to the acting user, and not be archived: a meeting can
/// never exist without a usable agent.
pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    let agent = agent_api::find_by_id_and_user(db, model.agent_id, model.user_id).await?;

    if agent.status == AgentStatus::Archived {
        warn!(
            "Refusing to create meeting with archived agent: {}",
            agent.id
        );
        return Err(Error::invalid());
    }

    Ok(meeting_api::create(db, model).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<Model, Error> {
    Ok(meeting_api::find_by_id_and_user(db, id, user_id).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    user_id: Id,
    filter: MeetingFilter,
) -> Result<Vec<Model>, Error> {
    Ok(meeting_api::find_by_user(db, user_id, filter.status, filter.agent_id, filter.name).await?)
}

/// Updates a meeting's name and assigned agent. Reassignment validates the
/// new agent the same way creation does.
pub async fn update(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
    model: Model,
) -> Result<Model, Error> {
    let existing = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    if model.agent_id != existing.agent_id {
        let agent = agent_api::find_by_id_and_user(db, model.agent_id, user_id).await?;
        if agent.status == AgentStatus::Archived {
            warn!("Refusing to reassign meeting {id} to archived agent: {}", agent.id);
            return Err(Error::invalid());
        }
    }

    Ok(meeting_api::update(db, id, model).await?)
}

/// Deletes a meeting. Permitted only from terminal states; a meeting still
/// moving through its lifecycle is rejected before any mutation.
pub async fn delete(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<(), Error> {
    let meeting = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    if !meeting.status.is_terminal() {
        warn!(
            "Refusing to delete meeting {id} in non-terminal status: {}",
            meeting.status
        );
        return Err(Error::invalid());
    }

    Ok(meeting_api::delete_by_id(db, id).await?)
}

/// Starts a meeting: creates the provider call and performs the guarded
/// `upcoming → active` transition, recording the call ID the provider's
/// webhooks will reference.
pub async fn start(
    db: &DatabaseConnection,
    video: &StreamVideoClient,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    let meeting = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    if meeting.status != MeetingStatus::Upcoming {
        warn!(
            "Cannot start meeting {id} from status: {}",
            meeting.status
        );
        return Err(Error::invalid());
    }

    let agent = agent_api::find_by_id_and_user(db, meeting.agent_id, user_id).await?;
    if agent.status != AgentStatus::Active {
        warn!("Cannot start meeting {id}: agent {} is {}", agent.id, agent.status);
        return Err(Error::invalid());
    }

    // Webhook events for this call will carry this ID back to us.
    let call_id = video
        .create_call("default", &meeting.id.to_string(), &user_id.to_string())
        .await?;

    let started = meeting_api::start_with_call(db, id, &call_id).await?;
    if !started {
        // Lost a race with another writer since the read above.
        warn!("Meeting {id} left upcoming before start could apply");
        return Err(Error::invalid());
    }

    info!("Meeting {id} → active (call {call_id})");
    Ok(meeting_api::find_by_id_and_user(db, id, user_id).await?)
}

/// User-initiated completion: the guarded `active → processing` transition.
/// The post-call pipeline takes over from here when the provider delivers
/// transcription artifacts.
pub async fn complete(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<Model, Error> {
    let _ = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    let transitioned = meeting_api::begin_processing(db, id, None, None).await?;
    if !transitioned {
        warn!("Cannot complete meeting {id}: not active");
        return Err(Error::invalid());
    }

    info!("Meeting {id} → processing");
    Ok(meeting_api::find_by_id_and_user(db, id, user_id).await?)
}

/// User-initiated cancellation: `upcoming|active → cancelled`. Any pipeline
/// job still in flight will observe the status and abandon its writes.
pub async fn cancel(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<Model, Error> {
    let _ = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    let cancelled = meeting_api::cancel(db, id).await?;
    if !cancelled {
        warn!("Cannot cancel meeting {id}: already terminal or processing");
        return Err(Error::invalid());
    }

    info!("Meeting {id} → cancelled");
    Ok(meeting_api::find_by_id_and_user(db, id, user_id).await?)
}

/// `upcoming → active` driven by a call-started webhook, matched by call ID.
/// Returns whether any meeting transitioned.
pub async fn activate_by_call_id(db: &DatabaseConnection, call_id: &str) -> Result<bool, Error> {
    let activated = meeting_api::start_by_call_id(db, call_id).await?;
    if activated {
        info!("Meeting with call {call_id} → active");
    } else {
        warn!("No upcoming meeting found for call: {call_id}");
    }
    Ok(activated)
}

/// Looks up a meeting by the provider's call ID (webhook dispatch path).
pub async fn find_by_call_id(
    db: &DatabaseConnection,
    call_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(meeting_api::find_by_call_id(db, call_id).await?)
}

/// The parsed transcript artifact, when the pipeline has produced one.
pub async fn transcript(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
) -> Result<Option<TranscriptArtifact>, Error> {
    let meeting = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    match meeting.transcript {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// The parsed summary artifact, when the pipeline has produced one.
pub async fn summary(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
) -> Result<Option<SummaryArtifact>, Error> {
    let meeting = meeting_api::find_by_id_and_user(db, id, user_id).await?;

    match meeting.summary {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// How many meetings reference an agent, scoped to the owner.
pub async fn count_by_agent(
    db: &DatabaseConnection,
    agent_id: Id,
    user_id: Id,
) -> Result<u64, Error> {
    Ok(meeting_api::count_by_agent(db, agent_id, user_id).await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn meeting_in(status: MeetingStatus, user_id: Id) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            user_id,
            agent_id: Uuid::new_v4(),
            name: "Weekly sync".to_string(),
            call_id: Some("abc123".to_string()),
            status,
            started_at: None,
            ended_at: None,
            duration_seconds: None,
            participants_count: None,
            recording_url: None,
            transcript: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn delete_rejects_meetings_still_in_flight() {
        let user_id = Uuid::new_v4();
        let meeting = meeting_in(MeetingStatus::Active, user_id);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .into_connection();

        let result = delete(&db, meeting_id, user_id).await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            crate::error::DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                crate::error::EntityErrorKind::Invalid
            ))
        ));
    }

    #[tokio::test]
    async fn delete_allows_terminal_meetings() {
        let user_id = Uuid::new_v4();
        let meeting = meeting_in(MeetingStatus::Cancelled, user_id);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting.clone()], [meeting]])
            .append_exec_results([exec(1)])
            .into_connection();

        assert!(delete(&db, meeting_id, user_id).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_is_rejected_once_processing() {
        let user_id = Uuid::new_v4();
        let meeting = meeting_in(MeetingStatus::Processing, user_id);
        let meeting_id = meeting.id;

        // The guarded update matches no rows for a processing meeting.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .append_exec_results([exec(0)])
            .into_connection();

        let result = cancel(&db, meeting_id, user_id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn complete_applies_the_guarded_transition() {
        let user_id = Uuid::new_v4();
        let active = meeting_in(MeetingStatus::Active, user_id);
        let meeting_id = active.id;
        let mut processing = active.clone();
        processing.status = MeetingStatus::Processing;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[active], [processing]])
            .append_exec_results([exec(1)])
            .into_connection();

        let meeting = complete(&db, meeting_id, user_id).await.unwrap();
        assert_eq!(meeting.status, MeetingStatus::Processing);
    }

    #[tokio::test]
    async fn ownership_is_checked_before_any_action() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id(&db, Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(
            result.unwrap_err().error_kind,
            crate::error::DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                crate::error::EntityErrorKind::NotFound
            ))
        ));
    }
}
