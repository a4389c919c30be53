use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

use crate::guard::fingerprint::ClientProfile;

/// Resolve the client address that scopes sessions and the submission ledger.
pub fn client_ip(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> IpAddr {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    // Only trust X-Forwarded-For if the direct connection is from a trusted proxy
    if !trusted_proxies.is_empty() && trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            // Take the first (leftmost) IP that isn't a trusted proxy
            for ip_str in xff.split(',').map(|s| s.trim()) {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                        return ip;
                    }
                }
            }
        }
    }

    peer
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Fill profile gaps from request headers when the page did not report them.
pub fn profile_from_headers(headers: &HeaderMap, mut profile: ClientProfile) -> ClientProfile {
    if profile.language.is_none() {
        profile.language = headers
            .get("accept-language")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split([',', ';']).next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }
    if profile.platform.is_none() {
        profile.platform = headers
            .get("sec-ch-ua-platform")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim_matches('"').to_string())
            .filter(|s| !s.is_empty());
    }
    profile
}
