use domain::gateway::llm::ChatProvider;
use events::JobDispatcher;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::sync::Arc;

pub(crate) mod controller;
pub(crate) mod error;
pub(crate) mod extractors;
pub(crate) mod params;
pub mod router;

pub use error::Error;

/// Application state shared across request handlers and the webhook endpoint.
/// Needs to implement Clone to be able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    database_connection: Arc<DatabaseConnection>,
    pub config: Config,
    pub dispatcher: Arc<dyn JobDispatcher>,
    pub llm: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: &Arc<DatabaseConnection>,
        dispatcher: Arc<dyn JobDispatcher>,
        llm: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config,
            dispatcher,
            llm,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}

/// Binds the configured interface/port and serves the API until shutdown.
pub async fn init_server(app_state: AppState) -> Result<(), std::io::Error> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!("Server listening on {host}:{port}");

    axum::serve(listener, router::define_routes(app_state)).await
}
