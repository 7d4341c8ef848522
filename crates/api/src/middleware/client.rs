//! Client address resolution for request logging.
//!
//! Behind a reverse proxy the socket peer is the proxy itself, so the first
//! `X-Forwarded-For` hop (then `X-Real-IP`) wins over the peer address.

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{Extensions, HeaderMap},
};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Best-known address of the caller, or `-` when nothing is known.
pub fn client_address(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    forwarded
        .into_iter()
        .chain(real_ip)
        .find(|addr| !addr.is_empty())
        .map(str::to_string)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "-".to_string())
}
