use anyhow::{Context, Result};
use chrono::Utc;

use super::utils::create_token_provider;
use crate::auth::TokenProvider;
use crate::state::Config;

/// Acquire a token and report what it grants, without printing the value.
pub async fn token(config: &Config) -> Result<()> {
    let provider = create_token_provider(config)?;
    let token = provider
        .access_token()
        .await
        .context("Failed to acquire an access token")?;

    println!("Service account: {}", provider.client_email());
    println!("Token type: {}", token.token_type);
    println!("Token: {}", token.masked());
    println!("Scope: {}", token.scope);

    let remaining = (token.expires_at - Utc::now()).num_seconds();
    if remaining > 0 {
        println!("Token expires in: {}s", remaining);
    } else {
        println!("Token expired (will refresh on next use)");
    }

    Ok(())
}
