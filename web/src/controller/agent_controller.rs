use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::agent::{CreateParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{agent as AgentApi, Id};
use service::config::ApiVersion;

use log::*;

/// GET all Agents owned by the authenticated user
#[utoipa::path(
    get,
    path = "/agents",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully retrieved all Agents", body = [domain::agents::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Agents for user: {user_id}");

    let agents = AgentApi::list(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), agents)))
}

/// POST create a new Agent
#[utoipa::path(
    post,
    path = "/agents",
    params(ApiVersion),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST create a new Agent from: {params:?}");

    let agent = AgentApi::create(app_state.db_conn_ref(), params.into_model(user_id)).await?;

    debug!("New Agent: {agent:?}");

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), agent)))
}

/// GET a single Agent by ID
#[utoipa::path(
    get,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Agent ID to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Agent by id: {id}");

    let agent = AgentApi::find_by_id(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), agent)))
}

/// PUT update an Agent
#[utoipa::path(
    put,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Agent ID to update")
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT update Agent {id} with: {params:?}");

    let existing = AgentApi::find_by_id(app_state.db_conn_ref(), id, user_id).await?;
    let agent =
        AgentApi::update(app_state.db_conn_ref(), id, user_id, params.apply_to(existing)).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), agent)))
}

/// DELETE an Agent. Agents still referenced by meetings cannot be deleted.
#[utoipa::path(
    delete,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Agent ID to delete")
    ),
    responses(
        (status = 204, description = "Successfully deleted the Agent"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
        (status = 422, description = "Agent is referenced by meetings"),
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Agent by id: {id}");

    AgentApi::delete(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
