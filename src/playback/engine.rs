use async_trait::async_trait;

use crate::auth::AccessToken;
use crate::drive::{media_url, TrackRef};
use crate::error::PlaybackError;
use crate::playback::EngineEvent;

/// An authenticated streaming request for one file.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub user_agent: String,
}

impl MediaRequest {
    /// The bearer token only ever travels in the `Authorization` header.
    pub fn for_track(api_base: &str, track: &TrackRef, token: &AccessToken, user_agent: &str) -> Self {
        Self {
            url: media_url(api_base, &track.id),
            headers: vec![("Authorization".to_string(), token.bearer())],
            user_agent: user_agent.to_string(),
        }
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers in `Name: value` form.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect()
    }
}

impl std::fmt::Debug for MediaRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("MediaRequest")
            .field("url", &self.url)
            .field("headers", &names)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[async_trait]
pub trait PlaybackEngine: Send {
    /// Begin loading the stream. Readiness is reported through `next_event`.
    async fn load(&mut self, request: &MediaRequest) -> Result<(), PlaybackError>;

    /// Next event for the loaded stream, or `None` once the engine is gone.
    async fn next_event(&mut self) -> Option<EngineEvent>;

    /// Free the player. Must be safe to call more than once.
    async fn release(&mut self) -> Result<(), PlaybackError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PlaybackEngine>, PlaybackError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn token(value: &str) -> AccessToken {
        AccessToken {
            value: value.to_string(),
            expires_at: Utc::now() + Duration::seconds(3600),
            token_type: "Bearer".to_string(),
            scope: crate::auth::DRIVE_READONLY_SCOPE.to_string(),
        }
    }

    #[test]
    fn test_request_for_track() {
        let request = MediaRequest::for_track(
            "https://www.googleapis.com/drive/v3",
            &TrackRef::new("1", "song.mp3"),
            &token("tok"),
            "cloudtune/test",
        );

        assert_eq!(request.url, "https://www.googleapis.com/drive/v3/files/1?alt=media");
        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        assert_eq!(request.header_lines(), vec!["Authorization: Bearer tok".to_string()]);
        assert!(!request.url.contains("tok"));
    }

    #[test]
    fn test_debug_omits_header_values() {
        let request = MediaRequest::for_track(
            "https://www.googleapis.com/drive/v3",
            &TrackRef::new("1", "song.mp3"),
            &token("secret-token"),
            "cloudtune/test",
        );
        let rendered = format!("{:?}", request);
        assert!(rendered.contains("Authorization"));
        assert!(!rendered.contains("secret-token"));
    }
}
