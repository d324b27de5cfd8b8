// src/prefs.rs
//! The preference document and its single-file JSON store.
//!
//! The store never caches: every [`PreferenceStore::load`] reads the file again, so edits
//! made outside this process are picked up on the next request.

use crate::error::{StoreError, ValidationError};
use crate::validation::RawPreferences;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

const STREAM_PATH_PATTERN: &str = r"^[A-Za-z0-9_-]{1,64}$";

static STREAM_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

/// Stream path used when no preferences have been stored yet.
pub const DEFAULT_STREAM_PATH: &str = "atem";

/// Relay protocols the appliance can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Rtmp,
    Rtsp,
    Srt,
    Hls,
}

impl Protocol {
    /// All protocols, in the order they are rendered.
    pub const ALL: [Protocol; 4] = [Protocol::Rtmp, Protocol::Rtsp, Protocol::Srt, Protocol::Hls];

    /// Lowercase name used as JSON key and relay config directive.
    pub fn name(self) -> &'static str {
        match self {
            Protocol::Rtmp => "rtmp",
            Protocol::Rtsp => "rtsp",
            Protocol::Srt => "srt",
            Protocol::Hls => "hls",
        }
    }

    /// The relay's standard listen port for this protocol.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Rtmp => 1935,
            Protocol::Rtsp => 8554,
            Protocol::Hls => 8888,
            Protocol::Srt => 8890,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated stream path: 1 to 64 ASCII letters, digits, `_` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamPath(String);

impl StreamPath {
    /// Trims `raw` and checks it against the identifier pattern.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let regex = STREAM_PATH_REGEX
            .get_or_init(|| Regex::new(STREAM_PATH_PATTERN).expect("stream path pattern is valid"));
        if regex.is_match(trimmed) {
            Ok(StreamPath(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidStreamPath(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StreamPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StreamPath::parse(&value)
    }
}

impl From<StreamPath> for String {
    fn from(path: StreamPath) -> Self {
        path.0
    }
}

impl Default for StreamPath {
    fn default() -> Self {
        StreamPath(DEFAULT_STREAM_PATH.to_string())
    }
}

impl fmt::Display for StreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-protocol enable flags. Missing entries deserialize as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolFlags {
    pub rtmp: bool,
    pub rtsp: bool,
    pub srt: bool,
    pub hls: bool,
}

impl Default for ProtocolFlags {
    fn default() -> Self {
        ProtocolFlags {
            rtmp: true,
            rtsp: true,
            srt: true,
            hls: true,
        }
    }
}

impl ProtocolFlags {
    pub fn get(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Rtmp => self.rtmp,
            Protocol::Rtsp => self.rtsp,
            Protocol::Srt => self.srt,
            Protocol::Hls => self.hls,
        }
    }

    pub fn set(&mut self, protocol: Protocol, enabled: bool) {
        match protocol {
            Protocol::Rtmp => self.rtmp = enabled,
            Protocol::Rtsp => self.rtsp = enabled,
            Protocol::Srt => self.srt = enabled,
            Protocol::Hls => self.hls = enabled,
        }
    }
}

/// Per-protocol listen ports. Missing entries deserialize as the standard port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolPorts {
    pub rtmp: u16,
    pub rtsp: u16,
    pub srt: u16,
    pub hls: u16,
}

impl Default for ProtocolPorts {
    fn default() -> Self {
        ProtocolPorts {
            rtmp: Protocol::Rtmp.default_port(),
            rtsp: Protocol::Rtsp.default_port(),
            srt: Protocol::Srt.default_port(),
            hls: Protocol::Hls.default_port(),
        }
    }
}

impl ProtocolPorts {
    pub fn get(&self, protocol: Protocol) -> u16 {
        match protocol {
            Protocol::Rtmp => self.rtmp,
            Protocol::Rtsp => self.rtsp,
            Protocol::Srt => self.srt,
            Protocol::Hls => self.hls,
        }
    }

    pub fn set(&mut self, protocol: Protocol, port: u16) {
        match protocol {
            Protocol::Rtmp => self.rtmp = port,
            Protocol::Rtsp => self.rtsp = port,
            Protocol::Srt => self.srt = port,
            Protocol::Hls => self.hls = port,
        }
    }
}

/// The persisted stream-routing preferences.
///
/// Serialized as `{"streamPath": .., "enable": {..}, "listen": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub stream_path: StreamPath,
    #[serde(default)]
    pub enable: ProtocolFlags,
    #[serde(default)]
    pub listen: ProtocolPorts,
}

/// Reads and writes the [`Preferences`] document at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferenceStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored preferences.
    ///
    /// Fields are read as leniently as a submission: a bad flag or port falls back to its
    /// default and the rest of the document is kept. A missing, unreadable or unparseable
    /// file, or one without a valid stream path, is treated as a first run: the default
    /// document is written back (best-effort) and returned.
    pub fn load(&self) -> Preferences {
        match self.read() {
            Ok(prefs) => {
                debug!("Loaded preferences from {}", self.path.display());
                prefs
            }
            Err(e) => {
                warn!("{}. Falling back to default preferences.", e);
                let defaults = Preferences::default();
                match self.save(&defaults) {
                    Ok(()) => info!("Wrote default preferences to {}", self.path.display()),
                    Err(e) => error!("Could not persist default preferences: {}", e),
                }
                defaults
            }
        }
    }

    fn read(&self) -> Result<Preferences, StoreError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let raw: RawPreferences = serde_json::from_str(&raw)?;
        Ok(raw.normalize()?)
    }

    /// Overwrites the stored document, creating the parent directory if needed.
    pub fn save(&self, prefs: &Preferences) -> Result<(), StoreError> {
        let mut content = serde_json::to_string_pretty(prefs)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Writes `contents` to a temp file next to `path`, then renames it into place.
///
/// Readers see either the old file or the new one, never a partial write.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    // NamedTempFile is created 0600; the relay may run as another user.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
