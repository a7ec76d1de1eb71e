use serde::{Deserialize, Serialize};

/// A remote audio file as shown in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
    pub name: String,
}

impl TrackRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    pub fn is_playable_audio(&self) -> bool {
        self.mime_type.starts_with("audio/") && !self.trashed
    }
}

impl From<DriveFile> for TrackRef {
    fn from(file: DriveFile) -> Self {
        TrackRef {
            id: file.id,
            name: file.name,
        }
    }
}
