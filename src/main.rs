use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;

use domain::gateway::llm::ChatProvider;
use domain::gateway::openai::OpenAiClient;
use events::JobDispatcher;
use pipeline::{JobQueue, PipelineWorker, RetryPolicy, WorkerSettings};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting Meet.ai API [{}] ...",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let openai_api_key = config.openai_api_key().unwrap_or_else(|| {
        error!("OPENAI_API_KEY is not configured");
        std::process::exit(1);
    });
    let llm: Arc<dyn ChatProvider> = match OpenAiClient::new(
        &openai_api_key,
        config.openai_base_url(),
        config.openai_model(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build OpenAI client: {e}");
            std::process::exit(1);
        }
    };

    let (queue, receiver) = JobQueue::new();
    let dispatcher: Arc<dyn JobDispatcher> = Arc::new(queue);

    let worker = PipelineWorker::new(
        Arc::clone(&db),
        Arc::clone(&llm),
        Arc::clone(&dispatcher),
        WorkerSettings {
            retry: RetryPolicy::new(config.pipeline_max_attempts),
            chunk_budget: config.summary_chunk_chars,
        },
    );
    tokio::spawn(worker.run(receiver));

    let app_state = web::AppState::new(config, &db, dispatcher, llm);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
