//! Authentication gate for the external case-management sync route.
//!
//! Checks run in order and stop at the first failure:
//! 1. `Authorization: Bearer <token>` present (401 otherwise)
//! 2. token matches the configured secret (403 `Invalid token`)
//! 3. peer address inside the allow-list, when one is configured (403 `IP not allowed`)
//!
//! With no secret configured the route is closed (503).

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// ADDRESS RANGES
// =============================================================================

/// One allow-list entry: a CIDR block or a bare address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedNetwork {
    addr: IpAddr,
    prefix_len: u8,
}

impl AllowedNetwork {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                prefix_match(&net.octets(), &ip.octets(), self.prefix_len)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                prefix_match(&net.octets(), &ip.octets(), self.prefix_len)
            }
            _ => false,
        }
    }

    /// Parse a comma-separated list, skipping blank entries.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from_str)
            .collect()
    }
}

impl FromStr for AllowedNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = match s.split_once('/') {
            Some((a, l)) => (a, Some(l)),
            None => (s, None),
        };
        let addr: IpAddr = addr_part
            .trim()
            .parse()
            .map_err(|_| format!("invalid address in allow-list entry '{}'", s))?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        let prefix_len = match len_part {
            Some(l) => l
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|l| *l <= max)
                .ok_or_else(|| format!("invalid prefix length in allow-list entry '{}'", s))?,
            None => max,
        };
        Ok(Self {
            addr: addr.to_canonical(),
            prefix_len,
        })
    }
}

fn prefix_match(net: &[u8], ip: &[u8], prefix_len: u8) -> bool {
    let full = (prefix_len / 8) as usize;
    let rest = prefix_len % 8;
    if net[..full] != ip[..full] {
        return false;
    }
    if rest == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - rest);
    (net[full] & mask) == (ip[full] & mask)
}

// =============================================================================
// GATEKEEPER
// =============================================================================

/// Why a sync call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDenied {
    NotConfigured,
    MissingToken,
    InvalidToken,
    AddressNotAllowed,
}

impl SyncDenied {
    pub fn message(&self) -> &'static str {
        match self {
            SyncDenied::NotConfigured => "Sync endpoint is not configured",
            SyncDenied::MissingToken => "Missing Bearer token",
            SyncDenied::InvalidToken => "Invalid token",
            SyncDenied::AddressNotAllowed => "IP not allowed",
        }
    }
}

/// Immutable token + allow-list check, built once at startup.
#[derive(Debug, Clone)]
pub struct SyncGatekeeper {
    token_digest: Option<[u8; 32]>,
    allowed: Vec<AllowedNetwork>,
}

impl SyncGatekeeper {
    /// A blank token leaves the gate closed.
    pub fn new(token: Option<&str>, allowed: Vec<AllowedNetwork>) -> Self {
        let token_digest = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(digest);
        Self {
            token_digest,
            allowed,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token_digest.is_some()
    }

    pub fn check(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Result<(), SyncDenied> {
        let expected = self.token_digest.ok_or(SyncDenied::NotConfigured)?;

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(SyncDenied::MissingToken)?;
        if digest(presented.trim()) != expected {
            return Err(SyncDenied::InvalidToken);
        }

        if !self.allowed.is_empty() {
            let allowed = peer.is_some_and(|ip| self.allowed.iter().any(|n| n.contains(ip)));
            if !allowed {
                return Err(SyncDenied::AddressNotAllowed);
            }
        }
        Ok(())
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Route layer for `/sync/*`.
pub async fn require_sync_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Err(denied) = state.gatekeeper.check(request.headers(), peer) {
        warn!(
            subsystem = "api",
            component = "sync_auth",
            peer_addr = ?peer,
            reason = denied.message(),
            "Sync request rejected"
        );
        return ApiError::from(denied).into_response();
    }
    next.run(request).await
}
