// src/render.rs
//! Renders [`Preferences`] into the relay's (MediaMTX) YAML configuration.

use crate::prefs::{Preferences, Protocol};

/// Order of the `<proto>Address` lines. Differs from the toggle order: HLS before SRT.
const ADDRESS_ORDER: [Protocol; 4] = [
    Protocol::Rtmp,
    Protocol::Rtsp,
    Protocol::Hls,
    Protocol::Srt,
];

/// Produces the relay configuration text for `prefs`.
///
/// The output depends only on `prefs`, so rendering the same document twice yields
/// identical bytes. Disabled protocols get a `<proto>: no` toggle and no address line.
pub fn render(prefs: &Preferences) -> String {
    let mut lines = vec!["logLevel: warn".to_string()];

    for protocol in Protocol::ALL {
        let toggle = if prefs.enable.get(protocol) { "yes" } else { "no" };
        lines.push(format!("{}: {}", protocol.name(), toggle));
    }
    for protocol in ADDRESS_ORDER {
        if prefs.enable.get(protocol) {
            lines.push(format!(
                "{}Address: :{}",
                protocol.name(),
                prefs.listen.get(protocol)
            ));
        }
    }

    lines.push(String::new());
    lines.push("paths:".to_string());
    // Quoted so names like `yes` or `1080` stay strings.
    lines.push(format!("  \"{}\":", prefs.stream_path));
    lines.push("    # Publishers push into this path; readers pull from it.".to_string());
    lines.push("    source: publisher".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
