use anyhow::Context;
use formation_backoffice::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, MongoRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long the driver waits for a reachable server before failing a request.
const MONGO_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// main
///
/// Loads configuration, sets up logging, connects the store and object
/// storage, then serves the API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("invalid configuration")?;

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "formation_backoffice=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Repository: MongoDB when configured, in-memory otherwise (local only).
    let repo: RepositoryState = match &config.mongodb_uri {
        Some(uri) => {
            let mongo = MongoRepository::connect(uri, &config.mongodb_db, MONGO_SELECTION_TIMEOUT)
                .await
                .context("failed to configure the MongoDB client")?;
            if let Err(e) = mongo.ensure_indexes().await {
                // The server may still be starting; requests will report 503 until it is up.
                tracing::warn!(error = %e, "could not create MongoDB indexes");
            }
            tracing::info!(database = %config.mongodb_db, "using MongoDB repository");
            Arc::new(mongo)
        }
        None => {
            tracing::warn!("MONGODB_URI not set: using the in-memory repository, data is lost on restart");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 4. Object storage (S3 / MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
        config.s3_public_url.as_deref(),
    );

    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }

    let storage = Arc::new(s3_client) as StorageState;

    // 5. Unified state and server
    let port = config.port;
    let app = create_router(AppState {
        repo,
        storage,
        config,
    });

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("Listening on {address}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
