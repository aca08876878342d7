use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::gateway::stream_video;
use serde::Serialize;
use service::config::ApiVersion;
use std::time::Duration;
use utoipa::ToSchema;

use log::*;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CallToken {
    /// Signed token the client presents to the video provider when joining
    token: String,
    user_id: String,
    expires_in_secs: u64,
}

/// GET a short-lived video call token for the authenticated user.
/// Clients call this before joining any call.
#[utoipa::path(
    get,
    path = "/call_token",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully issued a call token", body = CallToken),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Video provider credentials are not configured"),
    )
)]
pub async fn generate_call_token(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET call token for user: {user_id}");

    let config = &app_state.config;
    let video = stream_video::client_from_credentials(
        config.stream_api_key(),
        config.stream_api_secret(),
        config.stream_base_url(),
    )?;

    let expiry = Duration::from_secs(config.stream_token_expiry_secs);
    let token = video.issue_user_token(&user_id.to_string(), expiry)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        CallToken {
            token,
            user_id: user_id.to_string(),
            expires_in_secs: expiry.as_secs(),
        },
    )))
}
