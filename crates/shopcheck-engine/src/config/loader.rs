use super::schema::SuiteConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Names a config file that replaces the search below.
pub const CONFIG_ENV: &str = "SHOPCHECK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read suite config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Suite config {} is not valid YAML: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Suite config {} rejected: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Files the suite looks for, most specific first.
///
/// An override from the environment is the only candidate when present.
pub fn candidate_paths(env_override: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = env_override {
        return vec![path];
    }
    let mut paths = vec![PathBuf::from("shopcheck.yaml"), PathBuf::from("shopcheck.yml")];
    if let Some(home) = home {
        paths.push(home.join(".shopcheck").join("config.yaml"));
    }
    paths
}

/// Settings the engine cannot run with even though they deserialize.
pub fn validate(config: &SuiteConfig) -> Result<(), String> {
    if config.site.base_url.trim().is_empty() {
        return Err("site.base_url is empty".into());
    }
    if config.timeouts.poll_interval_ms == 0 {
        return Err("timeouts.poll_interval_ms must be positive".into());
    }
    if config.timeouts.navigation_attempts == 0 {
        return Err("timeouts.navigation_attempts must be at least 1".into());
    }
    if config.data.append_attempts == 0 {
        return Err("data.append_attempts must be at least 1".into());
    }
    Ok(())
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `$SHOPCHECK_CONFIG` if set. Otherwise the first of
    /// `./shopcheck.yaml`, `./shopcheck.yml` and `~/.shopcheck/config.yaml`
    /// that exists, or the built-in defaults when none does.
    pub async fn load_default() -> Result<SuiteConfig, ConfigError> {
        let env_override = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let required = env_override.is_some();

        for path in candidate_paths(env_override, dirs::home_dir()) {
            if required || tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }

        debug!("No suite config found; running on defaults");
        Ok(SuiteConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<SuiteConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(path, &content)?;
        info!("Suite config loaded from {}", path.display());
        Ok(config)
    }

    /// Deserialize and check a config document. `path` only labels errors.
    pub fn parse(path: &Path, content: &str) -> Result<SuiteConfig, ConfigError> {
        let config: SuiteConfig = if content.trim().is_empty() {
            SuiteConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };
        validate(&config).map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }
}
