use crate::drive::TrackRef;
use crate::error::RemoteError;
use async_trait::async_trait;

#[async_trait]
pub trait FileLister: Send + Sync {
    /// Fetch every non-trashed audio file visible to the credential.
    async fn list_audio_files(&self) -> Result<Vec<TrackRef>, RemoteError>;
}
