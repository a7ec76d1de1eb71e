use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::service_account::ServiceAccountKey;
use super::token::{AccessToken, TokenResponse};
use crate::error::AuthError;

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a bearer token that has not expired, refreshing it if needed.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Exchanges a signed service-account assertion for access tokens and caches
/// the result until it expires.
pub struct ServiceAccountProvider {
    key: ServiceAccountKey,
    scope: String,
    token: Mutex<Option<AccessToken>>,
    http: reqwest::Client,
}

impl ServiceAccountProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            scope: DRIVE_READONLY_SCOPE.to_string(),
            token: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let key = ServiceAccountKey::from_file(path)?;
        debug!(client = %key.client_email, "Loaded service credential from {:?}", path);
        Ok(Self::new(key))
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn sign_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &signing_key)?)
    }

    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.sign_assertion()?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;

        let token = parsed
            .into_access_token(&self.scope)
            .ok_or(AuthError::EmptyToken)?;

        // A lifetime inside the expiry skew would hand out a stale token.
        if token.is_expired() {
            return Err(AuthError::ExpiresTooSoon(token.expires_at));
        }
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        // Held across the refresh so concurrent callers share one request.
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
            debug!("Access token expired, refreshing");
        }

        match self.fetch_token().await {
            Ok(token) => {
                info!(scope = %token.scope, expires_at = %token.expires_at, "Access token acquired");
                *cached = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                warn!(client = %self.key.client_email, "Token refresh failed: {}", e);
                *cached = None;
                Err(e)
            }
        }
    }
}
