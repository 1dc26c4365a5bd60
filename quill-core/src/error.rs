use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuillError {
    #[error("No text entered!")]
    EmptyNotes,

    #[error("Command failed: {stage} exited with {status}: {stderr}")]
    PipelineFailed {
        stage: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Summarization cancelled")]
    Cancelled,

    #[error("Summarization timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QuillError>;
