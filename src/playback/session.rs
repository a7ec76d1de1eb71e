//! Single-session playback: token, authenticated request, one player at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth::TokenProvider;
use crate::drive::{TrackRef, DEFAULT_API_BASE};
use crate::error::PlaybackError;
use crate::playback::{
    EngineEvent, EngineFactory, MediaRequest, PlaybackEngine, PlaybackEvent, PlaybackState,
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub api_base: String,
    pub user_agent: String,
    pub prepare_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: format!("cloudtune/{}", env!("CARGO_PKG_VERSION")),
            prepare_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves once a `play` call reaches `Playing` or fails.
pub struct PlaybackTicket {
    track: TrackRef,
    outcome: oneshot::Receiver<Result<(), PlaybackError>>,
}

impl PlaybackTicket {
    pub fn track(&self) -> &TrackRef {
        &self.track
    }

    pub async fn outcome(self) -> Result<(), PlaybackError> {
        self.outcome.await.unwrap_or(Err(PlaybackError::Superseded))
    }
}

/// The live session. Its driver task owns the token and the player.
struct PlaybackSession {
    track: TrackRef,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct SessionManager {
    tokens: Arc<dyn TokenProvider>,
    engines: Arc<dyn EngineFactory>,
    options: SessionOptions,
    state_tx: Arc<watch::Sender<PlaybackState>>,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    current: Option<PlaybackSession>,
}

impl SessionManager {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        engines: Arc<dyn EngineFactory>,
        options: SessionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (state_tx, _) = watch::channel(PlaybackState::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let manager = Self {
            tokens,
            engines,
            options,
            state_tx: Arc::new(state_tx),
            events_tx,
            current: None,
        };
        (manager, events_rx)
    }

    pub fn state(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    pub fn current_state(&self) -> PlaybackState {
        *self.state_tx.borrow()
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.current
            .as_ref()
            .filter(|session| !session.task.is_finished())
            .map(|session| &session.track)
    }

    /// Start playing `track`. Any active session is released first.
    pub async fn play(&mut self, track: TrackRef) -> PlaybackTicket {
        if let Some(previous) = self.release_current().await {
            self.publish(&previous, PlaybackState::Idle);
        }

        info!(id = %track.id, name = %track.name, "Starting playback");

        let (settled_tx, settled_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let driver = Driver {
            track: track.clone(),
            tokens: self.tokens.clone(),
            engines: self.engines.clone(),
            options: self.options.clone(),
            state_tx: self.state_tx.clone(),
            events_tx: self.events_tx.clone(),
        };
        let task = tokio::spawn(driver.run(cancel.clone(), settled_tx));

        self.current = Some(PlaybackSession {
            track: track.clone(),
            cancel,
            task,
        });

        PlaybackTicket {
            track,
            outcome: settled_rx,
        }
    }

    pub async fn stop(&mut self) {
        if let Some(track) = self.release_current().await {
            info!(id = %track.id, "Playback stopped");
            self.publish(&track, PlaybackState::Idle);
        }
    }

    /// Cancel the active session and wait until its player is released.
    async fn release_current(&mut self) -> Option<TrackRef> {
        let session = self.current.take()?;
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!(id = %session.track.id, "Playback task ended abnormally: {}", e);
        }
        Some(session.track)
    }

    fn publish(&self, track: &TrackRef, state: PlaybackState) {
        self.state_tx.send_replace(state);
        let _ = self.events_tx.send(PlaybackEvent::StateChanged {
            track: track.clone(),
            state,
        });
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(session) = &self.current {
            session.cancel.cancel();
        }
    }
}

struct Driver {
    track: TrackRef,
    tokens: Arc<dyn TokenProvider>,
    engines: Arc<dyn EngineFactory>,
    options: SessionOptions,
    state_tx: Arc<watch::Sender<PlaybackState>>,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Driver {
    async fn run(
        self,
        cancel: CancellationToken,
        settled: oneshot::Sender<Result<(), PlaybackError>>,
    ) {
        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = self.tokens.access_token() => result,
        };

        // No player is created and nothing is requested without a token.
        let token = match token {
            Ok(token) => token,
            Err(e) => {
                let err = PlaybackError::Auth(e);
                self.fail(&err);
                let _ = settled.send(Err(err));
                return;
            }
        };

        let request = MediaRequest::for_track(
            &self.options.api_base,
            &self.track,
            &token,
            &self.options.user_agent,
        );

        let created = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = self.engines.create() => result,
        };

        let mut engine = match created {
            Ok(engine) => engine,
            Err(err) => {
                self.fail(&err);
                let _ = settled.send(Err(err));
                return;
            }
        };

        if cancel.is_cancelled() {
            release(engine.as_mut()).await;
            return;
        }

        self.set_state(PlaybackState::Preparing);
        debug!(url = %request.url, "Loading stream");

        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = prepare(engine.as_mut(), &request, self.options.prepare_timeout) => Some(result),
        };

        match prepared {
            None => {
                release(engine.as_mut()).await;
                return;
            }
            Some(Err(err)) => {
                release(engine.as_mut()).await;
                self.fail(&err);
                let _ = settled.send(Err(err));
                return;
            }
            Some(Ok(())) => {
                self.set_state(PlaybackState::Playing);
                let _ = settled.send(Ok(()));
            }
        }

        let ended = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = watch_stream(engine.as_mut()) => Some(result),
        };

        release(engine.as_mut()).await;

        match ended {
            None => {}
            Some(Ok(())) => {
                info!(id = %self.track.id, "Playback finished");
                self.set_state(PlaybackState::Idle);
                let _ = self.events_tx.send(PlaybackEvent::Finished {
                    track: self.track.clone(),
                });
            }
            Some(Err(err)) => self.fail(&err),
        }
    }

    fn set_state(&self, state: PlaybackState) {
        self.state_tx.send_replace(state);
        let _ = self.events_tx.send(PlaybackEvent::StateChanged {
            track: self.track.clone(),
            state,
        });
    }

    fn fail(&self, err: &PlaybackError) {
        error!(id = %self.track.id, name = %self.track.name, "Playback failed: {}", err);
        let _ = self.events_tx.send(PlaybackEvent::Failed {
            track: self.track.clone(),
            reason: err.to_string(),
        });
        self.set_state(PlaybackState::Error);
    }
}

async fn prepare(
    engine: &mut dyn PlaybackEngine,
    request: &MediaRequest,
    limit: Duration,
) -> Result<(), PlaybackError> {
    tokio::time::timeout(limit, load_until_ready(engine, request))
        .await
        .unwrap_or(Err(PlaybackError::Timeout(limit)))
}

async fn load_until_ready(
    engine: &mut dyn PlaybackEngine,
    request: &MediaRequest,
) -> Result<(), PlaybackError> {
    engine.load(request).await?;
    loop {
        match engine.next_event().await {
            Some(EngineEvent::Ready) => return Ok(()),
            Some(EngineEvent::Finished) => {
                return Err(PlaybackError::Engine(
                    "stream ended before playback started".to_string(),
                ))
            }
            Some(EngineEvent::Failed(reason)) => return Err(PlaybackError::Engine(reason)),
            None => return Err(PlaybackError::EngineGone),
        }
    }
}

async fn watch_stream(engine: &mut dyn PlaybackEngine) -> Result<(), PlaybackError> {
    loop {
        match engine.next_event().await {
            Some(EngineEvent::Ready) => continue,
            Some(EngineEvent::Finished) => return Ok(()),
            Some(EngineEvent::Failed(reason)) => return Err(PlaybackError::Engine(reason)),
            None => return Err(PlaybackError::EngineGone),
        }
    }
}

async fn release(engine: &mut dyn PlaybackEngine) {
    if let Err(e) = engine.release().await {
        warn!("Failed to release player: {}", e);
    }
}
