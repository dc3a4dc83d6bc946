mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the configuration file (if any) and applies environment overrides.
///
/// `CONFIG_PATH` must point at an existing file when set. Without it, a
/// missing `config.yaml` just means every default applies.
pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let required = explicit_path.is_some();
    let config_path = explicit_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = load_file(&config_path, required).await?;
    config.apply_env_overrides(|key| env::var(key).ok())?;
    Ok(config)
}

/// Reads a YAML config file. A missing file yields the defaults unless
/// `required` is set.
pub async fn load_file(config_path: &str, required: bool) -> Result<Config> {
    match tokio::fs::read_to_string(config_path).await {
        Ok(config_str) => {
            debug!("Loading configuration from: {}", config_path);
            parse(&config_str)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!("No {} found, using defaults", config_path);
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn parse(config_str: &str) -> Result<Config> {
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

impl Config {
    /// Overrides file values with `PORT`, `HOST`, `STABILITY_API_KEY` and
    /// `STABILITY_API_BASE_URL`. `lookup` is the variable source.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid PORT value: '{}'", port)))?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(key) = lookup("STABILITY_API_KEY") {
            self.stability.api_key = Some(key);
        }
        if let Some(base_url) = lookup("STABILITY_API_BASE_URL") {
            self.stability.base_url = base_url;
        }
        Ok(())
    }

    /// Startup checks. The server refuses to run without a credential.
    pub fn validate(&self) -> Result<()> {
        let has_key = self
            .stability
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(Error::config(
                "STABILITY_API_KEY is not set; refusing to start without an upstream credential",
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(Error::config("rate_limit.window_secs must be greater than 0"));
        }
        if self.stability.timeout_secs == 0 {
            return Err(Error::config("stability.timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}
