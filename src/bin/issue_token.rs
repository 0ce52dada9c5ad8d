//! Prints a one hour access token for a test user.
//!
//! Usage: `JWT_SECRET_KEY=... issue_token [user_id]`

use anyhow::Context;
use chrono::Duration;

use token_cache_guard::auth::{Claims, JwtKeys, DEFAULT_TOKEN_LIFETIME_SECS};

fn main() -> anyhow::Result<()> {
    let secret = std::env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
    let user_id = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());

    let keys = JwtKeys::from_secret(secret.as_bytes())?;
    let claims = Claims::new(user_id, Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
        .with_name("Test User")
        .with_email("testuser@example.com");

    println!("Your new JWT token: {}", keys.issue(&claims)?);
    Ok(())
}
