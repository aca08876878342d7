//! Agent persona operations, all ownership-scoped.

use crate::agents::Model;
use crate::error::Error;
use crate::Id;
use entity_api::{agent as agent_api, meeting as meeting_api};
use log::*;
use sea_orm::DatabaseConnection;

pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    Ok(agent_api::create(db, model).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<Model, Error> {
    Ok(agent_api::find_by_id_and_user(db, id, user_id).await?)
}

pub async fn list(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(agent_api::find_by_user(db, user_id).await?)
}

pub async fn update(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
    model: Model,
) -> Result<Model, Error> {
    let _ = agent_api::find_by_id_and_user(db, id, user_id).await?;
    Ok(agent_api::update(db, id, model).await?)
}

/// Deletes an agent. Agents referenced by any of the user's meetings cannot
/// be deleted; archive them instead.
pub async fn delete(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<(), Error> {
    let _ = agent_api::find_by_id_and_user(db, id, user_id).await?;

    let meeting_count = meeting_api::count_by_agent(db, id, user_id).await?;
    if meeting_count > 0 {
        warn!("Refusing to delete agent {id} referenced by {meeting_count} meeting(s)");
        return Err(Error::invalid());
    }

    Ok(agent_api::delete_by_id(db, id).await?)
}
