use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::meeting::ChatMessageParams;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::chat::{self as ChatApi, ChatSettings};
use domain::Id;
use service::config::ApiVersion;

use log::*;

/// GET the chat history for a Meeting, oldest message first
#[utoipa::path(
    get,
    path = "/meetings/{id}/chat",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the chat history", body = [domain::chat_messages::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(meeting_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET chat history for Meeting: {meeting_id}");

    let messages = ChatApi::history(app_state.db_conn_ref(), meeting_id, user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), messages)))
}

/// POST a question about a completed Meeting; returns the assistant's reply
#[utoipa::path(
    post,
    path = "/meetings/{id}/chat",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Meeting ID")
    ),
    request_body = ChatMessageParams,
    responses(
        (status = 201, description = "Assistant reply", body = domain::chat_messages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Chat is only available for completed meetings"),
        (status = 502, description = "LLM provider was unreachable"),
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(meeting_id): Path<Id>,
    Json(params): Json<ChatMessageParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST chat message for Meeting: {meeting_id}");

    let settings = ChatSettings {
        transcript_budget: app_state.config.chat_transcript_chars,
        history_turns: app_state.config.chat_history_turns,
    };

    let reply = ChatApi::send_message(
        app_state.db_conn_ref(),
        app_state.llm.as_ref(),
        &settings,
        meeting_id,
        user_id,
        params.message,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), reply)))
}
