//! Operational CLI: run the illustration workflow inline for given entries.
//!
//! Uses the same workflow as the API's `start-sync` endpoint and never
//! touches a job progress record. Prints one JSON line per key and exits
//! non-zero if any key failed.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use inkwell_core::types::JobKey;
use inkwell_db::collaborators::{PgContextResolver, PgResultSink};
use inkwell_imagegen::api::ImageApi;
use inkwell_imagegen::cache::ArtifactCache;
use inkwell_imagegen::config::{ImageApiConfig, MediaConfig};
use inkwell_imagegen::GenerationClient;
use inkwell_pipeline::assets::FsAssetResolver;
use inkwell_pipeline::config::PipelineConfig;
use inkwell_pipeline::{GenerationWorkflow, JobParams};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Generate diary illustrations synchronously.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Diary entry IDs to process, in order.
    #[arg(required = true)]
    keys: Vec<JobKey>,

    /// Ignore cached artifacts and call the provider again.
    #[arg(long)]
    regenerate: bool,

    /// Image size, `N` or `WxH`. Defaults to `DEFAULT_IMAGE_SIZE`.
    #[arg(long)]
    size: Option<String>,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

impl Cli {
    fn params(&self) -> JobParams {
        JobParams {
            regenerate: self.regenerate,
            size: self.size.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkwell_worker=info,inkwell_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let pool = match inkwell_db::create_pool(&cli.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    let pipeline_config = PipelineConfig::from_env();
    let api = match ImageApi::new(ImageApiConfig::from_env()) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build image API client");
            return ExitCode::FAILURE;
        }
    };
    let media = MediaConfig::from_env();

    let workflow = GenerationWorkflow::new(
        Arc::new(PgContextResolver::new(pool.clone())),
        Arc::new(FsAssetResolver::new(pipeline_config.asset_root)),
        Arc::new(GenerationClient::new(api, ArtifactCache::new(&media))),
        Arc::new(PgResultSink::new(pool.clone())),
        pipeline_config.default_size,
    );

    let params = cli.params();
    let mut failures = 0usize;

    for &key in &cli.keys {
        tracing::info!(job_key = key, regenerate = params.regenerate, "Running job");
        let line = match workflow.run_sync(key, &params).await {
            Ok(result) => json!({
                "key": key,
                "status": "DONE",
                "resultA": result.keyword_image,
                "resultB": result.character_image,
            }),
            Err(e) => {
                failures += 1;
                tracing::error!(job_key = key, kind = %e.kind(), error = %e, "Job failed");
                json!({
                    "key": key,
                    "status": "ERROR",
                    "errorKind": e.kind(),
                    "message": format!("error: {e}"),
                })
            }
        };
        println!("{line}");
    }

    pool.close().await;

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        tracing::warn!(failures, total = cli.keys.len(), "Some jobs failed");
        ExitCode::FAILURE
    }
}
