use crate::{controller::health_check_controller, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use log::*;
use tower_http::cors::CorsLayer;

use crate::controller::{
    agent_controller, call_token_controller, meeting, meeting_controller, webhook_controller,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Meet.ai API"
        ),
        paths(
            agent_controller::index,
            agent_controller::create,
            agent_controller::read,
            agent_controller::update,
            agent_controller::delete,
            meeting_controller::index,
            meeting_controller::create,
            meeting_controller::read,
            meeting_controller::update,
            meeting_controller::delete,
            meeting_controller::start,
            meeting_controller::complete,
            meeting_controller::cancel,
            meeting_controller::transcript,
            meeting_controller::summary,
            meeting::chat_controller::index,
            meeting::chat_controller::create,
            call_token_controller::generate_call_token,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::agents::Model,
                domain::chat_messages::Model,
                domain::meetings::Model,
                domain::agent_status::AgentStatus,
                domain::chat_role::ChatRole,
                domain::meeting_status::MeetingStatus,
                crate::params::agent::CreateParams,
                crate::params::agent::UpdateParams,
                crate::params::meeting::CreateParams,
                crate::params::meeting::UpdateParams,
                crate::params::meeting::ChatMessageParams,
                crate::controller::call_token_controller::CallToken,
            )
        ),
        tags(
            (name = "meetai", description = "Meet.ai meeting lifecycle API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(agent_routes(app_state.clone()))
        .merge(meeting_routes(app_state.clone()))
        .merge(chat_routes(app_state.clone()))
        .merge(call_token_routes(app_state.clone()))
        .merge(webhook_routes(app_state.clone()))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors_layer(&app_state))
}

fn agent_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/agents", get(agent_controller::index))
        .route("/agents", post(agent_controller::create))
        .route("/agents/{id}", get(agent_controller::read))
        .route("/agents/{id}", put(agent_controller::update))
        .route("/agents/{id}", delete(agent_controller::delete))
        .with_state(app_state)
}

fn meeting_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/meetings", get(meeting_controller::index))
        .route("/meetings", post(meeting_controller::create))
        .route("/meetings/{id}", get(meeting_controller::read))
        .route("/meetings/{id}", put(meeting_controller::update))
        .route("/meetings/{id}", delete(meeting_controller::delete))
        .route("/meetings/{id}/start", post(meeting_controller::start))
        .route("/meetings/{id}/complete", post(meeting_controller::complete))
        .route("/meetings/{id}/cancel", post(meeting_controller::cancel))
        .route(
            "/meetings/{id}/transcript",
            get(meeting_controller::transcript),
        )
        .route("/meetings/{id}/summary", get(meeting_controller::summary))
        .with_state(app_state)
}

fn chat_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/meetings/{id}/chat", get(meeting::chat_controller::index))
        .route("/meetings/{id}/chat", post(meeting::chat_controller::create))
        .with_state(app_state)
}

fn call_token_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/call_token",
            get(call_token_controller::generate_call_token),
        )
        .with_state(app_state)
}

fn webhook_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/webhooks/stream", post(webhook_controller::stream_webhook))
        .route("/webhooks/stream", get(webhook_controller::webhook_health))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping unparseable CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-version"),
            header::HeaderName::from_static("x-user-id"),
            header::HeaderName::from_static("x-signature"),
        ])
        .allow_origin(origins)
}
