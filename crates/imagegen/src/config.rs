use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the image generation provider.
#[derive(Debug, Clone)]
pub struct ImageApiConfig {
    /// Base URL of the provider API, without trailing slash.
    pub base_url: String,
    /// Bearer credential. Empty disables the `Authorization` header.
    pub api_key: String,
    /// Model name sent with every request.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ImageApiConfig {
    /// Load provider settings from environment variables with defaults.
    ///
    /// | Env Var                  | Default                     |
    /// |--------------------------|-----------------------------|
    /// | `IMAGE_API_BASE_URL`     | `https://api.openai.com/v1` |
    /// | `IMAGE_API_KEY`          | (empty)                     |
    /// | `IMAGE_MODEL`            | `gpt-image-1`               |
    /// | `IMAGE_API_TIMEOUT_SECS` | `180`                       |
    pub fn from_env() -> Self {
        let base_url = std::env::var("IMAGE_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into())
            .trim_end_matches('/')
            .to_string();

        let api_key = std::env::var("IMAGE_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("IMAGE_API_KEY is not set; provider calls will be unauthenticated");
        }

        let model = std::env::var("IMAGE_MODEL").unwrap_or_else(|_| "gpt-image-1".into());

        let timeout_secs: u64 = std::env::var("IMAGE_API_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("IMAGE_API_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Where generated artifacts are written and how they are referenced.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory holding the per-job artifact files.
    pub root: PathBuf,
    /// Public prefix prepended to artifact file names, e.g. `/media/diary`.
    pub url_prefix: String,
}

impl MediaConfig {
    /// Load media settings from environment variables with defaults.
    ///
    /// | Env Var            | Default         |
    /// |--------------------|-----------------|
    /// | `MEDIA_ROOT`       | `./media/diary` |
    /// | `MEDIA_URL_PREFIX` | `/media/diary`  |
    pub fn from_env() -> Self {
        let root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media/diary".into());
        let url_prefix = std::env::var("MEDIA_URL_PREFIX")
            .unwrap_or_else(|_| "/media/diary".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            root: PathBuf::from(root),
            url_prefix,
        }
    }
}
