// src/relay.rs
//! Asking the supervised relay service to pick up a new configuration.

use crate::config::AppConfig;
use crate::error::CommandError;
use crate::process::run_with_timeout;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info, warn};

/// How a reload request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// `systemctl reload` succeeded.
    Reloaded,
    /// Reload failed, `systemctl restart` succeeded.
    Restarted,
    /// Both commands failed. The new config takes effect on the next restart.
    Failed,
}

/// Issues `systemctl reload|restart` for the relay service.
#[derive(Debug, Clone)]
pub struct RelayController {
    systemctl: String,
    service: String,
    timeout: Duration,
}

impl RelayController {
    pub fn new(systemctl: impl Into<String>, service: impl Into<String>, timeout: Duration) -> Self {
        RelayController {
            systemctl: systemctl.into(),
            service: service.into(),
            timeout,
        }
    }

    pub fn from_config(app_config: &AppConfig) -> Self {
        RelayController::new(
            app_config.systemctl.clone(),
            app_config.relay_service.clone(),
            app_config.reload_timeout,
        )
    }

    /// Tries a graceful reload, then a restart. Never fails; the outcome is only reported.
    pub async fn reload(&self) -> ReloadOutcome {
        match self.systemctl("reload").await {
            Ok(()) => {
                info!("Reloaded {}", self.service);
                return ReloadOutcome::Reloaded;
            }
            Err(e) => warn!("Reload of {} failed: {}. Trying restart.", self.service, e),
        }

        match self.systemctl("restart").await {
            Ok(()) => {
                info!("Restarted {}", self.service);
                ReloadOutcome::Restarted
            }
            Err(e) => {
                error!("Restart of {} failed: {}", self.service, e);
                ReloadOutcome::Failed
            }
        }
    }

    async fn systemctl(&self, action: &str) -> Result<(), CommandError> {
        let mut cmd = Command::new(&self.systemctl);
        cmd.arg(action).arg(&self.service);
        run_with_timeout(cmd, self.timeout).await.map(|_| ())
    }
}
