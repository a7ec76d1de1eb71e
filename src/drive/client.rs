use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::auth::TokenProvider;
use crate::drive::types::FileListResponse;
use crate::drive::{FileLister, TrackRef};
use crate::error::RemoteError;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const AUDIO_QUERY: &str = "mimeType contains 'audio/' and trashed=false";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

/// URL that serves the raw bytes of a Drive file.
pub fn media_url(api_base: &str, file_id: &str) -> String {
    format!(
        "{}/files/{}?alt=media",
        api_base.trim_end_matches('/'),
        urlencoding::encode(file_id)
    )
}

pub struct DriveClient {
    api_base: String,
    page_size: u32,
    tokens: Arc<dyn TokenProvider>,
    http: reqwest::Client,
}

impl DriveClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: 100,
            tokens,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 1000);
        self
    }

    fn list_url(&self, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/files?q={}&fields={}&pageSize={}",
            self.api_base,
            urlencoding::encode(AUDIO_QUERY),
            urlencoding::encode(LIST_FIELDS),
            self.page_size
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    async fn api_get(&self, url: &str, token: &str) -> Result<FileListResponse, RemoteError> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(RemoteError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(RemoteError::Network)?;

        if !status.is_success() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl FileLister for DriveClient {
    async fn list_audio_files(&self) -> Result<Vec<TrackRef>, RemoteError> {
        let token = self.tokens.access_token().await?;

        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0u32;

        loop {
            let url = self.list_url(page_token.as_deref());
            let page = self.api_get(&url, &token.value).await?;
            pages += 1;

            let total = page.files.len();
            let before = tracks.len();
            tracks.extend(
                page.files
                    .into_iter()
                    .filter(|file| file.is_playable_audio())
                    .map(TrackRef::from),
            );

            let skipped = total - (tracks.len() - before);
            if skipped > 0 {
                debug!(skipped, "Dropped non-audio entries from listing page");
            }

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            match &page_token {
                None => break,
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    warn!(pages, "Drive repeated a page token, aborting listing");
                    return Err(RemoteError::Malformed(format!(
                        "page token {:?} was returned twice",
                        token
                    )));
                }
                Some(_) => {}
            }
        }

        info!(count = tracks.len(), pages, "Listed audio files");
        Ok(tracks)
    }
}
