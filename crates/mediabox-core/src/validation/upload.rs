//! Pre-flight checks for media uploads. Nothing here touches the network.

use std::path::{Component, Path};

use bytes::Bytes;

use crate::error::ClientError;
use crate::models::MediaKind;

pub use crate::constants::{MAX_IMAGE_SIZE_BYTES, MAX_VIDEO_SIZE_BYTES};

/// Classify an upload by MIME type and enforce the per-kind size limit.
pub fn validate_upload(content_type: &str, size: u64) -> Result<MediaKind, ClientError> {
    let kind = MediaKind::from_content_type(content_type)
        .ok_or_else(|| ClientError::UnsupportedMediaType(content_type.to_string()))?;

    match kind {
        MediaKind::Image if size > MAX_IMAGE_SIZE_BYTES => Err(ClientError::ImageTooLarge { size }),
        MediaKind::Video if size > MAX_VIDEO_SIZE_BYTES => Err(ClientError::VideoTooLarge { size }),
        _ => Ok(kind),
    }
}

/// MIME type guessed from the file extension; `application/octet-stream` when unknown.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// A file accepted for upload but not yet sent.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub data: Bytes,
}

impl PendingUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Result<Self, ClientError> {
        let content_type = content_type.into();
        let data = data.into();
        let kind = validate_upload(&content_type, data.len() as u64)?;

        Ok(Self {
            filename: filename.into(),
            content_type,
            kind,
            data,
        })
    }

    /// Read a local file. Type and size are checked from metadata before the contents are read.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ClientError::InvalidInput(format!(
                "Path traversal not allowed: {}",
                path.display()
            )));
        }

        let content_type = content_type_for_path(path);
        let metadata = std::fs::metadata(path).map_err(|e| {
            ClientError::InvalidInput(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        validate_upload(content_type, metadata.len())?;

        let data = std::fs::read(path).map_err(|e| {
            ClientError::InvalidInput(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        Self::new(filename, content_type, data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
