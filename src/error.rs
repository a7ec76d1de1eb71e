use std::path::PathBuf;
use std::time::Duration;

/// Credential loading and token acquisition failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read credentials from {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed service credential: {0}")]
    Malformed(String),
    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Token request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Token endpoint returned an empty access token")]
    EmptyToken,
    #[error("Token endpoint returned a token that is already due for refresh (expires at {0})")]
    ExpiresTooSoon(chrono::DateTime<chrono::Utc>),
}

/// Remote file listing failures.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Drive request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Drive API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Malformed Drive response: {0}")]
    Malformed(String),
}

/// Stream preparation and playback engine failures.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Failed to start player: {0}")]
    Spawn(String),
    #[error("Player error: {0}")]
    Engine(String),
    #[error("Stream was not ready after {0:?}")]
    Timeout(Duration),
    #[error("Player exited unexpectedly")]
    EngineGone,
    #[error("Playback was superseded")]
    Superseded,
}

impl From<std::io::Error> for PlaybackError {
    fn from(err: std::io::Error) -> Self {
        PlaybackError::Engine(err.to_string())
    }
}
