use std::path::PathBuf;

use inkwell_core::generation::DEFAULT_IMAGE_SIZE;

/// Workflow settings loaded from the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one base image per character type.
    pub asset_root: PathBuf,
    /// Size used when a submission does not specify one.
    pub default_size: String,
}

impl PipelineConfig {
    /// Load workflow settings from environment variables with defaults.
    ///
    /// | Env Var              | Default               |
    /// |----------------------|-----------------------|
    /// | `ASSET_ROOT`         | `./assets/characters` |
    /// | `DEFAULT_IMAGE_SIZE` | `1024`                |
    pub fn from_env() -> Self {
        let asset_root =
            std::env::var("ASSET_ROOT").unwrap_or_else(|_| "./assets/characters".into());
        let default_size =
            std::env::var("DEFAULT_IMAGE_SIZE").unwrap_or_else(|_| DEFAULT_IMAGE_SIZE.into());

        Self {
            asset_root: PathBuf::from(asset_root),
            default_size,
        }
    }
}
