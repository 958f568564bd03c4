use std::time::Duration;

use inkwell_imagegen::config::MediaConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. `start-sync` is exempt.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running jobs to drain.
    pub shutdown_timeout_secs: u64,
    /// Generated artifact location, served under its URL prefix.
    pub media: MediaConfig,
    /// Worker pool and job record retention.
    pub jobs: JobPoolConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `180`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// `REQUEST_TIMEOUT_SECS` does not apply to `start-sync`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            media: MediaConfig::from_env(),
            jobs: JobPoolConfig::from_env(),
        }
    }
}

/// Sizing of the background worker pool and the job record sweeper.
#[derive(Debug, Clone)]
pub struct JobPoolConfig {
    /// Number of concurrent workflow runs.
    pub workers: usize,
    /// Submissions that may wait for a free worker before `start` answers 503.
    pub queue_capacity: usize,
    /// Age after which finished job records are evicted.
    pub ttl: Duration,
    /// How often the sweeper looks for expired records.
    pub sweep_interval: Duration,
}

impl JobPoolConfig {
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `JOB_WORKERS`             | `4`     |
    /// | `JOB_QUEUE_CAPACITY`      | `32`    |
    /// | `JOB_TTL_SECS`            | `3600`  |
    /// | `JOB_SWEEP_INTERVAL_SECS` | `60`    |
    pub fn from_env() -> Self {
        let workers: usize = std::env::var("JOB_WORKERS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("JOB_WORKERS must be a valid usize");
        assert!(workers > 0, "JOB_WORKERS must be at least 1");

        let queue_capacity: usize = std::env::var("JOB_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "32".into())
            .parse()
            .expect("JOB_QUEUE_CAPACITY must be a valid usize");
        assert!(queue_capacity > 0, "JOB_QUEUE_CAPACITY must be at least 1");

        let ttl_secs: u64 = std::env::var("JOB_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("JOB_TTL_SECS must be a valid u64");

        let sweep_secs: u64 = std::env::var("JOB_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("JOB_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(sweep_secs > 0, "JOB_SWEEP_INTERVAL_SECS must be at least 1");

        Self {
            workers,
            queue_capacity,
            ttl: Duration::from_secs(ttl_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
        }
    }
}

impl Default for JobPoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 32,
            ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
