// src/validation.rs
//! Normalization of raw request bodies into [`Preferences`].
//!
//! Identity is strict: a bad `streamPath` rejects the whole request. Everything else is
//! lenient: unusable flags and ports fall back to their defaults instead of failing.

use crate::error::ValidationError;
use crate::prefs::{Preferences, Protocol, ProtocolFlags, ProtocolPorts, StreamPath};
use serde::Deserialize;
use serde_json::Value;

/// An unvalidated preference document as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreferences {
    #[serde(default)]
    pub stream_path: Value,
    #[serde(default)]
    pub enable: Value,
    #[serde(default)]
    pub listen: Value,
}

impl RawPreferences {
    /// Reads a request body. Anything other than a JSON object counts as an empty one.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => RawPreferences::default(),
        }
    }

    /// Validates the stream path and coerces flags and ports into a complete document.
    pub fn normalize(&self) -> Result<Preferences, ValidationError> {
        let raw_path = match &self.stream_path {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        let stream_path = StreamPath::parse(&raw_path)?;

        let mut enable = ProtocolFlags::default();
        let mut listen = ProtocolPorts::default();
        for protocol in Protocol::ALL {
            enable.set(protocol, coerce_flag(self.enable.get(protocol.name())));
            listen.set(
                protocol,
                coerce_port(self.listen.get(protocol.name()), protocol.default_port()),
            );
        }

        Ok(Preferences {
            stream_path,
            enable,
            listen,
        })
    }
}

/// Absent or null means enabled. Otherwise the usual JSON truthiness applies: only
/// `false`, `0` and the empty string switch a protocol off.
fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn coerce_port(value: Option<&Value>, default: u16) -> u16 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .unwrap_or(default)
}
