// Configuration loader
// Layers defaults, ~/.spontime/config.toml and SPONTIME_* environment variables

use anyhow::{bail, Context, Result};
use config::{Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

use super::settings::Config;

/// Load configuration from the Spontime config file and environment
pub fn load_config() -> Result<Config> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    load_config_from(&home.join(".spontime/config.toml"))
}

/// Load configuration using an explicit config file path
///
/// The file is optional; environment variables take precedence over it.
pub fn load_config_from(path: &Path) -> Result<Config> {
    debug!(path = %path.display(), "Loading configuration");

    let settings = config::Config::builder()
        .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix("SPONTIME").try_parsing(true))
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse Spontime configuration")?;

    if config.api_base_url.trim().is_empty() {
        bail!(
            "api_base_url is empty. Set it in ~/.spontime/config.toml or export \
             SPONTIME_API_BASE_URL=\"https://your-server/api/\""
        );
    }

    if config.timeout_seconds == 0 {
        bail!("timeout_seconds must be greater than zero");
    }

    Ok(config)
}
