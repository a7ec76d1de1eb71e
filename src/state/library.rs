use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::drive::{FileLister, TrackRef};
use crate::error::RemoteError;

/// Identifies one refresh request. Only the newest ticket may update the list.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced(usize),
    Superseded,
}

pub type RefreshResult = (u64, Result<Vec<TrackRef>, RemoteError>);

/// The list of tracks on display.
#[derive(Debug, Default)]
pub struct Library {
    tracks: Vec<TrackRef>,
    generation: u64,
    inflight: Option<CancellationToken>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&TrackRef> {
        self.tracks.get(index)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inflight.is_some()
    }

    /// Start a new refresh, cancelling the one in flight.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        if let Some(previous) = self.inflight.take() {
            debug!(generation = self.generation, "Superseding in-flight refresh");
            previous.cancel();
        }

        self.generation += 1;
        let cancel = CancellationToken::new();
        self.inflight = Some(cancel.clone());

        RefreshTicket {
            generation: self.generation,
            cancel,
        }
    }

    /// Apply a finished refresh. Stale generations are dropped; on failure the
    /// current list is kept and the error returned.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<Vec<TrackRef>, RemoteError>,
    ) -> Result<RefreshOutcome, RemoteError> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale listing");
            return Ok(RefreshOutcome::Superseded);
        }
        self.inflight = None;

        let tracks = result?;
        let count = tracks.len();
        self.tracks = tracks;
        Ok(RefreshOutcome::Replaced(count))
    }
}

/// Run a listing on a worker task and send the result back with its
/// generation. Nothing is sent if the ticket is cancelled first.
pub fn spawn_refresh(
    lister: Arc<dyn FileLister>,
    ticket: RefreshTicket,
    tx: mpsc::Sender<RefreshResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let RefreshTicket { generation, cancel } = ticket;

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(generation, "Listing cancelled");
                return;
            }
            result = lister.list_audio_files() => result,
        };

        match &result {
            Ok(tracks) => info!(generation, count = tracks.len(), "Listing finished"),
            Err(e) => warn!(generation, "Listing failed: {}", e),
        }

        let _ = tx.send((generation, result)).await;
    })
}
