// src/process.rs
//! Running external programs with a hard time limit.

use crate::error::CommandError;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Runs `cmd` to completion, failing if it exceeds `limit` or exits non-zero.
///
/// The child is killed when the limit elapses (`kill_on_drop`), so a hung tool never
/// outlives the request that started it.
pub async fn run_with_timeout(mut cmd: Command, limit: Duration) -> Result<Output, CommandError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {:?} (limit {:?})", cmd.as_std(), limit);

    let output = match timeout(limit, cmd.output()).await {
        Ok(result) => result.map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?,
        Err(_) => {
            return Err(CommandError::TimedOut {
                program,
                timeout: limit,
            })
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
