use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, Environment, Map};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_SERVICE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error(transparent)]
    Layer(#[from] config::ConfigError),
    #[error("Missing SUPABASE_URL or SUPABASE_SERVICE_KEY in the environment or .env file")]
    Missing,
}

/// Credentials for the remote table store.
#[derive(Clone)]
pub struct Settings {
    pub endpoint: String,
    pub service_key: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

impl Settings {
    /// Read `env_file` (if present) and the process environment; the process wins.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        let file_vars = read_env_file(env_file)?;
        let process_vars: Map<String, String> = std::env::vars().collect();
        Self::from_sources(file_vars, process_vars)
    }

    pub fn from_sources(
        file_vars: Map<String, String>,
        process_vars: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let layered = Config::builder()
            .add_source(Environment::default().source(Some(file_vars)))
            .add_source(Environment::default().source(Some(process_vars)))
            .build()?;

        let endpoint = lookup(&layered, URL_VAR).ok_or(ConfigError::Missing)?;
        let service_key = lookup(&layered, KEY_VAR).ok_or(ConfigError::Missing)?;
        Ok(Settings {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            service_key,
        })
    }
}

// Environment keys are lowercased by the config crate.
fn lookup(layered: &Config, var: &str) -> Option<String> {
    layered
        .get_string(&var.to_lowercase())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load a dotenv file into a map. A missing file yields an empty map.
///
/// Lines the dotenv parser rejects are logged and skipped.
pub fn read_env_file(path: &Path) -> Result<Map<String, String>, ConfigError> {
    if !path.exists() {
        info!("{} not found, using process environment only", path.display());
        return Ok(Map::new());
    }
    let env_err = |source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = Map::new();
    for item in dotenvy::from_path_iter(path).map_err(env_err)? {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping env line"),
        }
    }
    debug!(path = %path.display(), keys = vars.len(), "read env file");
    Ok(vars)
}
