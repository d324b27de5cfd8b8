// src/urls.rs
//! Connection URLs shown to operators (OBS, the ATEM, players).

use crate::prefs::Preferences;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Publish and pull URLs for each protocol.
///
/// Always computed for every protocol, whether or not it is enabled on the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionUrls {
    pub rtmp_publish: String,
    pub rtsp_pull: String,
    pub srt_pull: String,
    pub hls_pull: String,
}

impl ConnectionUrls {
    pub fn new(host: &str, prefs: &Preferences) -> Self {
        let stream = &prefs.stream_path;
        let ports = &prefs.listen;
        ConnectionUrls {
            rtmp_publish: format!("rtmp://{}:{}/{}", host, ports.rtmp, stream),
            rtsp_pull: format!("rtsp://{}:{}/{}", host, ports.rtsp, stream),
            srt_pull: format!("srt://{}:{}?streamid=publish://{}", host, ports.srt, stream),
            hls_pull: format!("http://{}:{}/{}/index.m3u8", host, ports.hls, stream),
        }
    }
}

/// Best guess at the address clients on the LAN can reach this host on.
///
/// Uses the source address the kernel would pick for outbound IPv4 traffic; connecting
/// a UDP socket sends nothing. Falls back to loopback when no route exists.
pub fn discover_host() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|s| s.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).map(|()| s))
        .and_then(|s| s.local_addr())
        .map(|addr| addr.ip())
        .ok()
        .filter(|ip| !ip.is_loopback() && !ip.is_unspecified())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
