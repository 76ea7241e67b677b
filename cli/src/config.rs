//! Layered configuration, lowest to highest priority:
//! built-in defaults, `sq-autopilot.toml` in the working directory,
//! `SQ_AUTOPILOT_*` environment variables, then `--runs-dir`.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use sqa_core::error::AppError;

pub const CONFIG_FILE: &str = "sq-autopilot.toml";
pub const ENV_PREFIX: &str = "SQ_AUTOPILOT_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    pub runs_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runs_dir: PathBuf::from("runs"),
            log: "warn".to_string(),
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(runs_dir_override: Option<&Path>) -> Result<Self, AppError> {
        let mut config: Self = Self::figment().extract().map_err(|e| {
            AppError::input("CONFIG_INVALID", "Configuration could not be loaded")
                .with_details(e.to_string())
        })?;
        if let Some(dir) = runs_dir_override {
            config.runs_dir = dir.to_path_buf();
        }
        Ok(config)
    }
}
