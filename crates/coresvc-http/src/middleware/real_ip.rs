//! Layer 5: resolves the client's address. Applied only when
//! `TRUST_PROXY=true`; otherwise the direct peer address from the TCP
//! connection is authoritative.
//!
//! Structured as an enum today rather than a bare bool so a future
//! trusted-proxy CIDR allow-list can be added without changing call sites
//! (recorded as an open decision: the distilled contract only toggles
//! header parsing, so an allow-list isn't implemented here).

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustProxy {
    Direct,
    TrustedProxy,
}

impl TrustProxy {
    #[must_use]
    pub fn from_config(trust_proxy: bool) -> Self {
        if trust_proxy {
            Self::TrustedProxy
        } else {
            Self::Direct
        }
    }
}

fn parse_forwarded_for(value: &str) -> Option<IpAddr> {
    value.split(',').next()?.trim().parse().ok()
}

/// Stamps a [`ClientIp`] extension, preferring `X-Forwarded-For` /
/// `Forwarded` only under [`TrustProxy::TrustedProxy`]; otherwise the
/// connection's peer address is used unconditionally.
pub async fn resolve(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let trust_proxy = TrustProxy::from_config(state.config.trust_proxy);

    let ip = if trust_proxy == TrustProxy::TrustedProxy {
        request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_forwarded_for)
            .unwrap_or_else(|| peer.ip())
    } else {
        peer.ip()
    };

    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_mode_ignores_forwarded_header() {
        assert_eq!(TrustProxy::from_config(false), TrustProxy::Direct);
    }

    #[test]
    fn parses_first_address_in_forwarded_for() {
        let ip = parse_forwarded_for("203.0.113.4, 10.0.0.1");
        assert_eq!(ip, Some("203.0.113.4".parse().unwrap()));
    }

    #[test]
    fn rejects_malformed_forwarded_for() {
        assert_eq!(parse_forwarded_for("not-an-ip"), None);
    }
}
