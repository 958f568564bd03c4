use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use inkwell_api::config::ServerConfig;
use inkwell_api::engine::dispatcher::JobDispatcher;
use inkwell_api::router::build_app_router;
use inkwell_api::state::AppState;
use inkwell_core::job_store::JobStateStore;
use inkwell_db::collaborators::{PgContextResolver, PgResultSink};
use inkwell_imagegen::api::ImageApi;
use inkwell_imagegen::cache::ArtifactCache;
use inkwell_imagegen::config::ImageApiConfig;
use inkwell_imagegen::GenerationClient;
use inkwell_pipeline::assets::FsAssetResolver;
use inkwell_pipeline::config::PipelineConfig;
use inkwell_pipeline::GenerationWorkflow;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();
    let image_api_config = ImageApiConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        media_root = %config.media.root.display(),
        asset_root = %pipeline_config.asset_root.display(),
        model = %image_api_config.model,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = inkwell_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    inkwell_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    inkwell_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Generation workflow ---
    let api = ImageApi::new(image_api_config).expect("Failed to build image API client");
    let generator = GenerationClient::new(api, ArtifactCache::new(&config.media));
    let workflow = Arc::new(GenerationWorkflow::new(
        Arc::new(PgContextResolver::new(pool.clone())),
        Arc::new(FsAssetResolver::new(pipeline_config.asset_root)),
        Arc::new(generator),
        Arc::new(PgResultSink::new(pool.clone())),
        pipeline_config.default_size,
    ));

    // --- Job store and worker pool ---
    let jobs = Arc::new(JobStateStore::new());
    let (dispatcher, worker_pool) =
        JobDispatcher::start(Arc::clone(&workflow), Arc::clone(&jobs), &config.jobs);

    // --- Eviction sweeper ---
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(inkwell_api::background::job_eviction::run(
        Arc::clone(&jobs),
        config.jobs.ttl,
        config.jobs.sweep_interval,
        sweeper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        jobs,
        dispatcher,
        workflow,
    };

    // --- Router ---
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

    // Let queued and running jobs finish.
    worker_pool
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Job eviction sweeper stopped");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` switches to one JSON object per line; anything else
/// uses the human-readable format.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inkwell_api=debug,inkwell_pipeline=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
