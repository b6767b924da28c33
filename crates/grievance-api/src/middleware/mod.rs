//! HTTP middleware.

pub mod rate_limit;
pub mod sync_auth;

pub use rate_limit::{rate_limit_middleware, GlobalRateLimiter};
pub use sync_auth::{require_sync_auth, AllowedNetwork, SyncDenied, SyncGatekeeper};
