// src/config.rs
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_WEB_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PREFS_PATH: &str = "/etc/atem-relay/config.json";
const DEFAULT_RELAY_CONFIG_PATH: &str = "/etc/mediamtx/mediamtx.yml";
const DEFAULT_RELAY_SERVICE: &str = "mediamtx.service";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;
const DEFAULT_RELOAD_TIMEOUT_MS: u64 = 5000;

/// Command-line arguments for the application.
#[derive(Parser, Debug, Deserialize, Default)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// HTTP address for the web UI and API (e.g., "0.0.0.0:8080")
    #[clap(
        short,
        long,
        value_parser,
        help = "HTTP address for the web UI and API (e.g., \"0.0.0.0:8080\")"
    )]
    pub webaddr: Option<String>,

    /// Path to a configuration file (e.g., atem-relay.toml)
    #[clap(
        short,
        long,
        value_parser,
        help = "Path to a configuration file (e.g., atem-relay.toml)"
    )]
    pub config: Option<PathBuf>,

    /// Where the stream preferences are stored
    #[clap(long, value_parser, help = "Where the stream preferences JSON is stored")]
    pub prefs: Option<PathBuf>,

    /// Where the rendered relay (MediaMTX) config is written
    #[clap(
        long,
        value_parser,
        help = "Where the rendered relay (MediaMTX) config is written"
    )]
    pub relay_config: Option<PathBuf>,

    /// systemd unit of the relay
    #[clap(short, long, value_parser, help = "systemd unit of the relay")]
    pub service: Option<String>,

    /// Host advertised in connection URLs instead of the discovered address
    #[clap(
        long,
        value_parser,
        help = "Host advertised in connection URLs instead of the discovered address"
    )]
    pub public_host: Option<String>,

    /// Log level (e.g., trace, debug, info, warn, error)
    #[clap(
        long,
        value_parser,
        help = "Log level (e.g., trace, debug, info, warn, error)"
    )]
    pub log_level: Option<String>,
}

/// Configuration loaded from file, environment, or defaults.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct FileConfig {
    /// Web address
    pub webaddr: Option<String>,
    /// Preference document path
    pub prefs_path: Option<PathBuf>,
    /// Rendered relay config path
    pub relay_config_path: Option<PathBuf>,
    /// Relay systemd unit
    pub relay_service: Option<String>,
    /// systemctl binary
    pub systemctl: Option<String>,
    /// ffprobe binary
    pub ffprobe: Option<String>,
    /// Probe time limit in milliseconds
    pub probe_timeout_ms: Option<u64>,
    /// Reload/restart time limit in milliseconds
    pub reload_timeout_ms: Option<u64>,
    /// Advertised host override
    pub public_host: Option<String>,
    /// Log level
    pub log_level: Option<String>,
}

/// Final application configuration after merging all sources.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP address for web UI and API
    pub web_addr: String,
    /// Preference document path
    pub prefs_path: PathBuf,
    /// Rendered relay config path
    pub relay_config_path: PathBuf,
    /// Relay systemd unit
    pub relay_service: String,
    /// systemctl binary
    pub systemctl: String,
    /// ffprobe binary
    pub ffprobe: String,
    /// Upper bound for one probe
    pub probe_timeout: Duration,
    /// Upper bound for each of reload and restart
    pub reload_timeout: Duration,
    /// Host shown in connection URLs; discovered when `None`
    pub public_host: Option<String>,
    /// Log level
    pub log_level: String,
}

impl AppConfig {
    /// Loads the application configuration by merging CLI, file, environment, and defaults.
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_args(CliArgs::parse())
    }

    /// Merges already-parsed CLI arguments over file, environment, and defaults.
    pub fn from_args(cli_args: CliArgs) -> Result<Self, figment::Error> {
        let config_file_path = cli_args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("atem-relay.toml"));

        // Default log level from environment variable ATEM_RELAY_LOG_LEVEL, then "info"
        let default_log_level =
            std::env::var("ATEM_RELAY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fig = Figment::new()
            .merge(Serialized::defaults(FileConfig {
                webaddr: Some(DEFAULT_WEB_ADDR.to_string()),
                prefs_path: Some(PathBuf::from(DEFAULT_PREFS_PATH)),
                relay_config_path: Some(PathBuf::from(DEFAULT_RELAY_CONFIG_PATH)),
                relay_service: Some(DEFAULT_RELAY_SERVICE.to_string()),
                systemctl: Some("systemctl".to_string()),
                ffprobe: Some("ffprobe".to_string()),
                probe_timeout_ms: Some(DEFAULT_PROBE_TIMEOUT_MS),
                reload_timeout_ms: Some(DEFAULT_RELOAD_TIMEOUT_MS),
                public_host: None,
                log_level: Some(default_log_level.clone()),
            }))
            .merge(Toml::file(config_file_path).nested())
            // Env vars join the `relay` profile so they outrank the file's `[relay]` table.
            .merge(
                Env::prefixed("ATEM_RELAY_")
                    .map(|key| key.as_str().replace("__", ".").into())
                    .profile("relay"),
            );

        let mut merged_config: FileConfig = fig.select("relay").extract()?;

        // CLI always wins for the fields it exposes.
        if let Some(wa) = cli_args.webaddr {
            merged_config.webaddr = Some(wa);
        }
        if let Some(prefs) = cli_args.prefs {
            merged_config.prefs_path = Some(prefs);
        }
        if let Some(relay_config) = cli_args.relay_config {
            merged_config.relay_config_path = Some(relay_config);
        }
        if let Some(service) = cli_args.service {
            merged_config.relay_service = Some(service);
        }
        if let Some(host) = cli_args.public_host {
            merged_config.public_host = Some(host);
        }
        if let Some(cli_ll) = cli_args.log_level {
            merged_config.log_level = Some(cli_ll);
        }

        Ok(AppConfig {
            web_addr: merged_config
                .webaddr
                .unwrap_or_else(|| DEFAULT_WEB_ADDR.to_string()),
            prefs_path: merged_config
                .prefs_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_PATH)),
            relay_config_path: merged_config
                .relay_config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RELAY_CONFIG_PATH)),
            relay_service: merged_config
                .relay_service
                .unwrap_or_else(|| DEFAULT_RELAY_SERVICE.to_string()),
            systemctl: merged_config
                .systemctl
                .unwrap_or_else(|| "systemctl".to_string()),
            ffprobe: merged_config
                .ffprobe
                .unwrap_or_else(|| "ffprobe".to_string()),
            probe_timeout: Duration::from_millis(
                merged_config
                    .probe_timeout_ms
                    .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS),
            ),
            reload_timeout: Duration::from_millis(
                merged_config
                    .reload_timeout_ms
                    .unwrap_or(DEFAULT_RELOAD_TIMEOUT_MS),
            ),
            public_host: merged_config.public_host.filter(|h| !h.trim().is_empty()),
            log_level: merged_config.log_level.unwrap_or(default_log_level),
        })
    }
}
