use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{mlog_debug, Error, Result};

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where headless artifacts and the run log are written.
    pub output_dir: Option<String>,
    /// Kill a stage that runs longer than this. No limit when unset.
    pub stage_timeout_secs: Option<u64>,
    /// Append an entry to `logs.json` after every pipeline run.
    #[serde(default = "default_run_log")]
    pub run_log: bool,
}

fn default_run_log() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            stage_timeout_secs: None,
            run_log: default_run_log(),
        }
    }
}

impl Config {
    pub fn monthend_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".monthend"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::monthend_dir()?.join("monthend.toml"))
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => expand_tilde(dir),
            None => PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }

    /// Load from `~/.monthend/monthend.toml`, falling back to defaults when
    /// the file (or the home directory) is missing.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(Error::NoHomeDir) => {
                mlog_debug!("No home directory, using default config");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        mlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            mlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        if config.stage_timeout_secs == Some(0) {
            return Err(Error::Validation(
                "stage_timeout_secs must be greater than zero".to_string(),
            ));
        }
        mlog_debug!(
            "Config loaded: output_dir={:?}, stage_timeout_secs={:?}, run_log={}",
            config.output_dir,
            config.stage_timeout_secs,
            config.run_log
        );
        Ok(config)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
