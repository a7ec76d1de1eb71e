use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AuthError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A Google service-account key file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = fs::read_to_string(path).map_err(|source| AuthError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::Malformed(e.to_string()))?;

        if key.kind != "service_account" {
            return Err(AuthError::Malformed(format!(
                "expected type \"service_account\", found \"{}\"",
                key.kind
            )));
        }
        if key.client_email.trim().is_empty() {
            return Err(AuthError::Malformed("client_email is empty".to_string()));
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err(AuthError::Malformed(
                "private_key is not a PEM encoded key".to_string(),
            ));
        }

        Ok(key)
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tempfile::TempDir;

    #[test]
    fn test_parse_valid_key() {
        let json = testing::service_account_json("https://oauth2.googleapis.com/token");
        let key = ServiceAccountKey::from_json(&json).unwrap();
        assert_eq!(key.client_email, "player@cloudtune-test.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.private_key_id.as_deref(), Some("test-key-id"));
    }

    #[test]
    fn test_token_uri_defaults() {
        let json = serde_json::json!({
            "type": "service_account",
            "client_email": "a@b.iam.gserviceaccount.com",
            "private_key": testing::TEST_PRIVATE_KEY,
        })
        .to_string();
        let key = ServiceAccountKey::from_json(&json).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = ServiceAccountKey::from_file(&temp.path().join("credentials.json")).unwrap_err();
        assert!(matches!(err, AuthError::Unreadable { .. }));
    }

    #[test]
    fn test_not_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        let err = ServiceAccountKey::from_file(&path).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[test]
    fn test_wrong_type() {
        let json = serde_json::json!({
            "type": "authorized_user",
            "client_email": "a@b.com",
            "private_key": testing::TEST_PRIVATE_KEY,
        })
        .to_string();
        let err = ServiceAccountKey::from_json(&json).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[test]
    fn test_missing_private_key() {
        let json = r#"{"type": "service_account", "client_email": "a@b.com", "private_key": ""}"#;
        assert!(matches!(
            ServiceAccountKey::from_json(json),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let json = testing::service_account_json(DEFAULT_TOKEN_URI);
        let key = ServiceAccountKey::from_json(&json).unwrap();
        assert!(!format!("{:?}", key).contains("PRIVATE KEY"));
    }
}
