// src/error.rs
//! Error types shared across the preference, apply and process modules.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Rejected user input. Only the stream path is validated strictly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid streamPath. Use 1-64 letters, numbers, _ or -")]
    InvalidStreamPath(String),
}

/// Failures reading or writing the preference document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read preferences from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("stored preferences are invalid: {0}")]
    Invalid(#[from] ValidationError),

    #[error("failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures running an external program.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Errors surfaced by the apply pipeline to the caller.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write relay config to {path}: {source}")]
    RelayConfig {
        path: PathBuf,
        source: std::io::Error,
    },
}
