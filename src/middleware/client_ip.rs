use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::error::AppError;

/// 请求方 IP
///
/// 对端是本机时（前面有 nginx 之类的反向代理），依次取 `X-Real-IP`
/// 和 `X-Forwarded-For` 的第一个地址；否则直接使用连接地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_canonical());

        resolve_client_ip(peer, &parts.headers)
            .map(ClientIp)
            .ok_or_else(|| AppError::MalformedRequest("cannot determine client address".into()))
    }
}

pub fn resolve_client_ip(peer: Option<IpAddr>, headers: &HeaderMap) -> Option<IpAddr> {
    match peer {
        Some(ip) if !ip.is_loopback() => Some(ip),
        _ => forwarded_ip(headers).or(peer),
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
            .and_then(|ip| ip.parse::<IpAddr>().ok())
    };

    header_ip("x-real-ip").or_else(|| header_ip("x-forwarded-for"))
}
