use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::{
    auth::{ServiceAccountProvider, TokenProvider},
    drive::{DriveClient, FileLister, TrackRef},
    playback::{MpvFactory, PlaybackEvent, SessionManager, SessionOptions},
    state::Config,
};

pub fn create_token_provider(config: &Config) -> Result<Arc<ServiceAccountProvider>> {
    let provider = ServiceAccountProvider::from_file(&config.credentials)
        .with_context(|| {
            format!(
                "No usable service credential at {:?}. Pass --credentials or set CLOUDTUNE_CREDENTIALS.",
                config.credentials
            )
        })?
        .with_scope(config.scope.clone());
    Ok(Arc::new(provider))
}

pub fn create_lister(config: &Config, tokens: Arc<dyn TokenProvider>) -> Arc<dyn FileLister> {
    Arc::new(
        DriveClient::new(tokens)
            .with_api_base(config.api_base.clone())
            .with_page_size(config.page_size),
    )
}

pub fn create_session_manager(
    config: &Config,
    tokens: Arc<dyn TokenProvider>,
) -> (SessionManager, mpsc::UnboundedReceiver<PlaybackEvent>) {
    let options = SessionOptions {
        api_base: config.api_base.clone(),
        user_agent: config.user_agent.clone(),
        prepare_timeout: config.prepare_timeout(),
    };
    SessionManager::new(tokens, Arc::new(MpvFactory::new(config.mpv_path.clone())), options)
}

pub fn print_tracks(tracks: &[TrackRef]) {
    if tracks.is_empty() {
        println!("No audio files found.");
        return;
    }
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>3}. {}  ({})", i + 1, track.name, track.id);
    }
}

pub fn describe_event(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::StateChanged { track, state } => format!("[{}] {}", state, track.name),
        PlaybackEvent::Finished { track } => format!("Finished: {}", track.name),
        PlaybackEvent::Failed { track, reason } => {
            format!("Could not play {}: {}", track.name, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackState;

    #[test]
    fn test_describe_event() {
        let track = TrackRef::new("1", "song.mp3");
        assert_eq!(
            describe_event(&PlaybackEvent::StateChanged {
                track: track.clone(),
                state: PlaybackState::Playing
            }),
            "[playing] song.mp3"
        );
        assert_eq!(
            describe_event(&PlaybackEvent::Failed {
                track,
                reason: "HTTP 404".to_string()
            }),
            "Could not play song.mp3: HTTP 404"
        );
    }

    #[test]
    fn test_missing_credentials_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            credentials: temp.path().join("missing.json"),
            ..Config::default()
        };
        let err = create_token_provider(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("missing.json"));
    }
}
