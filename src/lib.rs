// src/lib.rs

#![doc = r#"
# atem-relay

Configuration front-end for an ATEM-to-MediaMTX relay appliance. It stores a small set of
stream-routing preferences, renders them into the relay's config file, asks the relay to
reload, and reports live stream status through `ffprobe`.

## Modules

- [`config`]: Application configuration merged from CLI, file, and environment.
- [`prefs`]: The preference document and its JSON store.
- [`validation`]: Normalization of client-submitted preferences.
- [`render`]: Relay config generation.
- [`relay`]: Reload/restart of the relay service.
- [`apply`]: The save workflow tying the above together.
- [`status`]: On-demand stream probing.
- [`urls`]: Publish/pull URLs for operators.
- [`web`]: HTTP API and UI.
"#]

pub mod apply;
pub mod config;
pub mod error;
pub mod prefs;
pub mod process;
pub mod relay;
pub mod render;
pub mod status;
pub mod urls;
pub mod validation;
pub mod web;
