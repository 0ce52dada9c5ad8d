//! Auth Module
//!
//! Bearer parsing, token digests, JWT verification and the revocation guard.

mod digest;
mod jwt;
mod revocation;

pub use digest::{parse_bearer, token_digest};
pub use jwt::{Claims, JwtError, JwtKeys, DEFAULT_TOKEN_LIFETIME_SECS};
pub use revocation::{
    revocation_key, GuardCounters, GuardStats, RevocationGuard, BLACKLIST_PREFIX, REVOKED_MARKER,
};
