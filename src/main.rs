// src/main.rs

use dotenvy::dotenv;
use quiz_trainer::config::Config;
use quiz_trainer::data::DataHandle;
use quiz_trainer::routes;
use quiz_trainer::state::AppState;
use quiz_trainer::store::SqliteStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let (config, config_warnings) = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
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

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    let options = match SqliteConnectOptions::from_str(&config.database_url) {
        Ok(options) => options.create_if_missing(true),
        Err(e) => {
            tracing::error!("Invalid DATABASE_URL {}: {}", config.database_url, e);
            return;
        }
    };

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to open database after 5 retries: {}", e);
                    return;
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    let store = SqliteStore::new(pool);
    tracing::info!("Running migrations...");
    if let Err(e) = store.migrate().await {
        tracing::error!("Failed to run database migrations: {}", e);
        return;
    }
    tracing::info!("Migrations applied successfully.");

    // Load question data; failures are served as errors until reloaded
    let data = DataHandle::load(config.questions_path.clone(), config.topics_path.clone()).await;
    match data.questions().await {
        Ok(bank) => tracing::info!("Loaded {} questions from {}", bank.len(), config.questions_path.display()),
        Err(e) => tracing::error!("{}", e),
    }
    if let Err(e) = data.topics().await {
        tracing::error!("{}", e);
    }

    let port = config.port;
    let state = AppState::new(Arc::new(store), data, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
