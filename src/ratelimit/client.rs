use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const ASK_CAPABILITY: &str = "ai-ask";
pub const INDEX_CAPABILITY: &str = "ai-index";

const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort caller address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub fn rate_key(capability: &str, client: &str) -> String {
    format!("{}:{}", capability, client)
}
