//! Main Entrypoint for the Interview Coach API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the session store and LLM-backed services.
//! 3. Constructing the orchestrator and the Axum router.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use coach_api::{
    config::{Config, Provider},
    router::create_router,
    state::AppState,
};
use coach_core::{
    engine::{AnswerEvaluator, LlmEngine, QuestionGenerator, StaticEngine},
    gamification::NoopNotifier,
    orchestrator::{OrchestratorConfig, SessionOrchestrator},
    retry::RetryPolicy,
    store::MemoryStore,
    summary::{LlmSummaryService, StaticSummaryService, SummaryGenerator},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Store and Services ---
    let store = Arc::new(MemoryStore::new());

    let engine_config = match &config.provider {
        Provider::Groq => {
            info!("Using Groq provider.");
            let api_key = config
                .groq_api_key
                .as_ref()
                .context("GROQ_API_KEY missing after validation")?;
            Some(
                OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(GROQ_API_BASE),
            )
        }
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            let api_key = config
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY missing after validation")?;
            Some(
                OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(OPENAI_API_BASE),
            )
        }
        Provider::Static => {
            info!("Using static engine; no external calls will be made.");
            None
        }
    };

    let (generator, evaluator, summarizer): (
        Arc<dyn QuestionGenerator>,
        Arc<dyn AnswerEvaluator>,
        Arc<dyn SummaryGenerator>,
    ) = match engine_config {
        Some(openai_config) => {
            let engine = Arc::new(LlmEngine::new(
                openai_config.clone(),
                config.chat_model.clone(),
            ));
            let summarizer = Arc::new(LlmSummaryService::new(
                openai_config,
                config.chat_model.clone(),
                store.clone(),
            ));
            (engine.clone(), engine, summarizer)
        }
        None => {
            let engine = Arc::new(StaticEngine);
            let summarizer = Arc::new(StaticSummaryService::new(store.clone()));
            (engine.clone(), engine, summarizer)
        }
    };

    // --- 4. Build the Orchestrator ---
    let orchestrator = Arc::new(SessionOrchestrator::new(
        store.clone(),
        generator,
        evaluator,
        summarizer,
        Arc::new(NoopNotifier),
        OrchestratorConfig {
            question_time_limit: config.question_time_limit,
            retry: RetryPolicy {
                max_attempts: config.max_retry_attempts,
                ..RetryPolicy::default()
            },
            ..OrchestratorConfig::default()
        },
    ));

    let app_state = Arc::new(AppState {
        orchestrator,
        store,
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
