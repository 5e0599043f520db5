// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use exam_online::ai::client::{GeminiClient, LanguageModel};
use exam_online::config::Config;
use exam_online::routes;
use exam_online::state::AppState;
use exam_online::utils::store::SessionStore;
use exam_online::utils::submit::{HttpScoreSubmitter, ScoreSubmitter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "exam.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let model: Arc<dyn LanguageModel> = Arc::new(GeminiClient::from_config(&config)?);
    tracing::info!("Using model {}", config.gemini_model);

    let submitter: Option<Arc<dyn ScoreSubmitter>> = match &config.score_endpoint {
        Some(endpoint) => Some(Arc::new(HttpScoreSubmitter::new(endpoint)?)),
        None => {
            tracing::warn!("SCORE_ENDPOINT not set; results will not be submitted");
            None
        }
    };

    let sessions = SessionStore::new();

    // Sweep expired sessions in the background
    let sweeper = sessions.clone();
    let ttl = config.session_ttl_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired(ttl);
            if purged > 0 {
                tracing::info!("Purged {} expired session(s)", purged);
            }
        }
    });

    let state = AppState {
        config: config.clone(),
        sessions,
        model,
        submitter,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}
