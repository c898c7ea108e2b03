//! Client IP extraction
//!
//! The service usually runs behind the main web application or a reverse
//! proxy, so the peer address is not necessarily the client. X-Forwarded-For
//! is only honored when the peer is a configured trusted proxy, or when no
//! proxies are configured and the connection comes from a private address.

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use tracing::debug;

use crate::config::get_config;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 (ULA)
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 (link-local)
        }
    }
}

/// Whether `peer` (an `ip` or `ip:port` string) matches the trusted proxy
/// list. Entries may be plain IPs or CIDR blocks.
pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let peer_ip = if let Ok(socket_addr) = peer.parse::<SocketAddr>() {
        socket_addr.ip()
    } else if let Ok(ip_addr) = peer.parse::<IpAddr>() {
        ip_addr
    } else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&peer_ip, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|addr| addr == peer_ip)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            (u32::from_be_bytes(ip.octets()) & mask) == (u32::from_be_bytes(net.octets()) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            (u128::from_be_bytes(ip.octets()) & mask) == (u128::from_be_bytes(net.octets()) & mask)
        }
        _ => false,
    }
}

/// Extract the real client IP from a request.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let conn_info = req.connection_info();
    let peer_ip = conn_info.peer_addr()?;

    let trusted_proxies = &get_config().server.trusted_proxies;
    if !trusted_proxies.is_empty() {
        if is_trusted_proxy(peer_ip, trusted_proxies) {
            let real_ip = extract_forwarded_ip(req).unwrap_or_else(|| peer_ip.to_string());
            debug!("Trusted proxy: {} -> {}", peer_ip, real_ip);
            return Some(real_ip);
        }
        // configured but no match: the forwarded header cannot be trusted
        return Some(peer_ip.to_string());
    }

    // No proxy list configured: honor the forwarded header only for
    // connections from private addresses (assumed local reverse proxy)
    if let Ok(ip_addr) = peer_ip.parse::<IpAddr>()
        && is_private_or_local(&ip_addr)
        && let Some(real_ip) = extract_forwarded_ip(req)
    {
        debug!(
            "Auto-detect proxy (private peer {}): using forwarded ip {}",
            peer_ip, real_ip
        );
        return Some(real_ip);
    }

    Some(peer_ip.to_string())
}

/// X-Forwarded-For (first entry) with X-Real-IP as fallback
fn extract_forwarded_ip(req: &HttpRequest) -> Option<String> {
    let headers = req.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        })
}
