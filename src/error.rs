// Error taxonomy shared by the store, the CLI and the interactive session
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HabError {
    #[error("failed to access data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse data file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Validation(String),
    #[error("habit '{0}' does not exist")]
    NotFound(String),
    #[error("habit '{0}' already exists")]
    AlreadyExists(String),
    #[error("date '{date}' not found in habit '{id}'")]
    EntryNotFound { id: String, date: NaiveDate },
}

impl HabError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HabError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        HabError::Format {
            path: path.into(),
            source,
        }
    }
}
