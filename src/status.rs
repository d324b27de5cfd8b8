// src/status.rs
//! Live stream status, probed on demand with `ffprobe`.

use crate::config::AppConfig;
use crate::error::CommandError;
use crate::prefs::Preferences;
use crate::process::run_with_timeout;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// One entry of ffprobe's `streams` array. Fields ffprobe omits stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_frame_rate: Option<String>,
}

/// The structured part of ffprobe's JSON output that the UI displays.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

impl ProbeReport {
    /// Parses ffprobe stdout. Empty output is an empty report.
    pub fn parse(stdout: &[u8]) -> Result<Self, serde_json::Error> {
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(ProbeReport::default());
        }
        serde_json::from_slice(stdout)
    }
}

/// Result of a status check. `probe` is omitted when offline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeReport>,
}

impl StatusSnapshot {
    pub fn offline() -> Self {
        StatusSnapshot {
            online: false,
            probe: None,
        }
    }

    pub fn online(report: ProbeReport) -> Self {
        StatusSnapshot {
            online: true,
            probe: Some(report),
        }
    }
}

/// Why a probe came back offline. Only ever logged.
#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("unparseable ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The relay's local RTSP pull URL for the configured stream.
pub fn pull_url(prefs: &Preferences) -> String {
    format!(
        "rtsp://127.0.0.1:{}/{}",
        prefs.listen.rtsp, prefs.stream_path
    )
}

/// Inspects the relay's stream with an external probing tool.
#[derive(Debug, Clone)]
pub struct StatusProber {
    ffprobe: String,
    timeout: Duration,
}

impl StatusProber {
    pub fn new(ffprobe: impl Into<String>, timeout: Duration) -> Self {
        StatusProber {
            ffprobe: ffprobe.into(),
            timeout,
        }
    }

    pub fn from_config(app_config: &AppConfig) -> Self {
        StatusProber::new(app_config.ffprobe.clone(), app_config.probe_timeout)
    }

    /// Probes the first video stream. Any failure reports the stream as offline.
    pub async fn probe(&self, prefs: &Preferences) -> StatusSnapshot {
        let url = pull_url(prefs);
        match self.run(&url).await {
            Ok(report) => {
                if let Some(stream) = report.streams.first() {
                    debug!(
                        "{} online: {} {}x{} @ {}",
                        url,
                        stream.codec_name.as_deref().unwrap_or("?"),
                        stream.width.unwrap_or_default(),
                        stream.height.unwrap_or_default(),
                        stream.avg_frame_rate.as_deref().unwrap_or("?")
                    );
                }
                StatusSnapshot::online(report)
            }
            Err(e) => {
                debug!("{} offline: {}", url, e);
                StatusSnapshot::offline()
            }
        }
    }

    async fn run(&self, url: &str) -> Result<ProbeReport, ProbeError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,avg_frame_rate",
            "-of",
            "json",
            url,
        ]);
        let output = run_with_timeout(cmd, self.timeout).await?;
        Ok(ProbeReport::parse(&output.stdout)?)
    }
}
