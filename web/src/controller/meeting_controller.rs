use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::meeting::{CreateParams, IndexParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::gateway::stream_video;
use domain::{meeting as MeetingApi, Id};
use service::config::ApiVersion;

use log::*;

/// GET all Meetings owned by the authenticated user
#[utoipa::path(
    get,
    path = "/meetings",
    params(ApiVersion, IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved Meetings", body = [domain::meetings::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Meetings with filter: {params:?}");

    let meetings = MeetingApi::list(app_state.db_conn_ref(), user_id, params.into()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meetings)))
}

/// POST create a new Meeting in the `upcoming` state
#[utoipa::path(
    post,
    path = "/meetings",
    params(ApiVersion),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Assigned agent not found"),
        (status = 422, description = "Unprocessable Entity"),
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST create a new Meeting from: {params:?}");

    let meeting =
        MeetingApi::create(app_state.db_conn_ref(), params.into_model(user_id)).await?;

    debug!("New Meeting: {meeting:?}");

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), meeting)))
}

/// GET a single Meeting by ID
#[utoipa::path(
    get,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Meeting by id: {id}");

    let meeting = MeetingApi::find_by_id(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meeting)))
}

/// PUT update a Meeting's name or assigned agent
#[utoipa::path(
    put,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to update")
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT update Meeting {id} with: {params:?}");

    let existing = MeetingApi::find_by_id(app_state.db_conn_ref(), id, user_id).await?;
    let meeting = MeetingApi::update(
        app_state.db_conn_ref(),
        id,
        user_id,
        params.apply_to(existing),
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meeting)))
}

/// DELETE a Meeting. Allowed only from terminal states (completed, cancelled).
#[utoipa::path(
    delete,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to delete")
    ),
    responses(
        (status = 204, description = "Successfully deleted the Meeting"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Meeting is not in a terminal state"),
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Meeting by id: {id}");

    MeetingApi::delete(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}

/// POST start a Meeting: creates the provider call and transitions
/// `upcoming → active`
#[utoipa::path(
    post,
    path = "/meetings/{id}/start",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to start")
    ),
    responses(
        (status = 200, description = "Meeting started", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Meeting cannot be started from its current state"),
    )
)]
pub async fn start(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST start Meeting: {id}");

    let config = &app_state.config;
    let video = stream_video::client_from_credentials(
        config.stream_api_key(),
        config.stream_api_secret(),
        config.stream_base_url(),
    )?;

    let meeting = MeetingApi::start(app_state.db_conn_ref(), &video, id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meeting)))
}

/// POST complete a Meeting: transitions `active → processing`; the post-call
/// pipeline finishes the rest when provider artifacts arrive
#[utoipa::path(
    post,
    path = "/meetings/{id}/complete",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to complete")
    ),
    responses(
        (status = 200, description = "Meeting moved to processing", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Meeting is not active"),
    )
)]
pub async fn complete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST complete Meeting: {id}");

    let meeting = MeetingApi::complete(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meeting)))
}

/// POST cancel a Meeting: transitions `upcoming|active → cancelled`
#[utoipa::path(
    post,
    path = "/meetings/{id}/cancel",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID to cancel")
    ),
    responses(
        (status = 200, description = "Meeting cancelled", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Meeting cannot be cancelled from its current state"),
    )
)]
pub async fn cancel(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST cancel Meeting: {id}");

    let meeting = MeetingApi::cancel(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), meeting)))
}

/// GET a Meeting's transcript artifact, when processing has produced one
#[utoipa::path(
    get,
    path = "/meetings/{id}/transcript",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID")
    ),
    responses(
        (status = 200, description = "The transcript artifact, or null if not yet available"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    )
)]
pub async fn transcript(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET transcript for Meeting: {id}");

    let transcript = MeetingApi::transcript(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), transcript)))
}

/// GET a Meeting's summary artifact, when processing has produced one
#[utoipa::path(
    get,
    path = "/meetings/{id}/summary",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID")
    ),
    responses(
        (status = 200, description = "The summary artifact, or null if not yet available"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    )
)]
pub async fn summary(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET summary for Meeting: {id}");

    let summary = MeetingApi::summary(app_state.db_conn_ref(), id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), summary)))
}
