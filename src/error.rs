use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference error: {0}")]
    Preference(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("File {0:?} is locked by another writer")]
    FileLocked(PathBuf),

    #[error("Process spawn failed: {0}")]
    ProcessSpawnFailed(String),

    #[error("Resolution tool reported an error: {0}")]
    ResolutionTool(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
