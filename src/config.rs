// Runtime configuration gathered once from the process environment
use std::path::PathBuf;

use crate::capability::EnvSignals;

pub const DATA_FILE_VAR: &str = "HAB_DATA_FILE";
pub const RENDERING_VAR: &str = "HAB_RENDERING";
pub const DEBUG_VAR: &str = "HAB_DEBUG";
pub const JSON_VAR: &str = "HAB_JSON";
pub const LOG_VAR: &str = "HAB_LOG";

/// Everything the binary reads from the environment. Nothing below `main`
/// touches `std::env` directly.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub data_file: PathBuf,
    pub signals: EnvSignals,
    pub debug: bool,
    pub json_output: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file = lookup(DATA_FILE_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_file);

        let signals = EnvSignals {
            rendering_override: lookup(RENDERING_VAR).filter(|v| !v.is_empty()),
            term: lookup("TERM"),
            lang: lookup("LANG"),
            lc_all: lookup("LC_ALL"),
        };

        Self {
            data_file,
            signals,
            debug: lookup(DEBUG_VAR).is_some_and(|v| v == "true"),
            json_output: lookup(JSON_VAR).is_some(),
        }
    }

    /// Log file used while the interactive session owns the terminal
    pub fn log_file(&self) -> PathBuf {
        self.data_file
            .parent()
            .map(|dir| dir.join("hab.log"))
            .unwrap_or_else(|| PathBuf::from("hab.log"))
    }
}

/// `<config dir>/hab/data/activities.json`, or `data/activities.json` when the
/// platform has no config directory.
pub fn default_data_file() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("hab").join("data").join("activities.json"),
        None => PathBuf::from("data").join("activities.json"),
    }
}
