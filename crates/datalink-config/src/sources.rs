// Configuration source loading.
//
// Priority order:
// 1. Config file path from DATALINK_CONFIG
// 2. Inline config content from DATALINK_CONFIG_CONTENT
// 3. Default config files (./datalink.toml, ./config.toml)
//
// There are no built-in jobs, so a run without any config source is an
// error rather than a silent default.

use crate::RuntimeConfig;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;

/// Environment lookup seam, injectable for tests.
trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Load configuration from the standard sources.
pub fn load_config() -> Result<RuntimeConfig> {
    match load_from_sources(&StdEnvSource)? {
        Some(config) => {
            config.validate()?;
            Ok(config)
        }
        None => bail!(
            "No configuration found. Set DATALINK_CONFIG, DATALINK_CONFIG_CONTENT, \
             or create ./datalink.toml"
        ),
    }
}

fn load_from_sources(env: &dyn EnvSource) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("DATALINK_CONFIG") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: RuntimeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Some(content) = env.get("DATALINK_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from DATALINK_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./datalink.toml", "./config.toml"] {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: RuntimeConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }
    }

    Ok(None)
}

/// Load configuration from a specific file path (for the CLI --config flag).
/// Returns an error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: RuntimeConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.validate()?;
    Ok(config)
}
