use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mediagen_generation::{
    ArtifactStore, MemoryArtifactStore, PgArtifactStore, StableDiffusionClient, VoicevoxClient,
};
use mediagen_jobs::{sweeper, EngineSettings, JobManager};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediagen_api=debug,mediagen_jobs=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Artifact store ---
    let store: Arc<dyn ArtifactStore> = match &config.database_url {
        Some(database_url) => {
            let pool = mediagen_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            mediagen_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            mediagen_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgArtifactStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, image metadata is kept in memory");
            Arc::new(MemoryArtifactStore::new())
        }
    };

    // --- Backends ---
    let image = Arc::new(StableDiffusionClient::new(
        config.sd_api_url.clone(),
        config.sd_output_dir.clone(),
    ));
    let audio = Arc::new(VoicevoxClient::new(
        config.voicevox_api_url.clone(),
        config.voicevox_output_dir.clone(),
    ));
    tracing::info!(
        sd_api_url = %config.sd_api_url,
        voicevox_api_url = %config.voicevox_api_url,
        "Generation backends configured",
    );

    // --- Job engine ---
    let jobs = Arc::new(JobManager::new(
        image.clone(),
        audio.clone(),
        Arc::clone(&store),
        EngineSettings {
            defaults: config.defaults.clone(),
            unit_delay: config.job_unit_delay(),
        },
    ));

    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(sweeper::run(
        jobs.registry(),
        config.job_retention(),
        config.job_sweep_interval(),
        sweeper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
        image,
        audio,
        store,
        started_at: Instant::now(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Job sweeper stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
