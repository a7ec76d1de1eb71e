use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::auth::DRIVE_READONLY_SCOPE;
use crate::drive::DEFAULT_API_BASE;

pub const CREDENTIALS_ENV: &str = "CLOUDTUNE_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials: PathBuf,
    pub api_base: String,
    pub scope: String,
    pub page_size: u32,
    pub mpv_path: String,
    pub user_agent: String,
    pub prepare_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from("credentials.json"),
            api_base: DEFAULT_API_BASE.to_string(),
            scope: DRIVE_READONLY_SCOPE.to_string(),
            page_size: 100,
            mpv_path: "mpv".to_string(),
            user_agent: format!("cloudtune/{}", env!("CARGO_PKG_VERSION")),
            prepare_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML from {:?}", path))
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(&self).with_context(|| "Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(path, content).with_context(|| format!("Failed to write config to {:?}", path))
    }

    /// Apply the credentials override from the environment, then the one
    /// given on the command line.
    pub fn with_overrides(mut self, credentials: Option<PathBuf>) -> Self {
        if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
            if !path.trim().is_empty() {
                self.credentials = PathBuf::from(path);
            }
        }
        if let Some(path) = credentials {
            self.credentials = path;
        }
        self
    }

    pub fn prepare_timeout(&self) -> Duration {
        Duration::from_secs(self.prepare_timeout_secs.max(1))
    }
}
