use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Seconds before the real expiry at which a token is treated as stale.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    pub scope: String,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS)
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// First few characters of the value, for display.
    pub fn masked(&self) -> String {
        let prefix: String = self.value.chars().take(6).collect();
        format!("{}…", prefix)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    pub(crate) fn into_access_token(self, scope: &str) -> Option<AccessToken> {
        if self.access_token.is_empty() {
            return None;
        }

        Some(AccessToken {
            value: self.access_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            token_type: self.token_type,
            scope: scope.to_string(),
        })
    }
}
