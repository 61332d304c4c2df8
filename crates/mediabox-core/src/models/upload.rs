use serde::{Deserialize, Serialize};

use super::media::MediaKind;

/// Response of the upload endpoints. Video uploads carry the processing job id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub video_uuid: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Result of an accepted upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub kind: MediaKind,
    pub status: u16,
    pub response: UploadResponse,
}

impl UploadOutcome {
    /// Job identifier to poll, present only for accepted video uploads.
    pub fn video_job(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Video => self
                .response
                .video_uuid
                .as_deref()
                .filter(|id| !id.is_empty()),
            MediaKind::Image => None,
        }
    }
}
