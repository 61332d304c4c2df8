use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MEDIA_DELIVERY_EMBED_SEGMENT, MEDIA_DELIVERY_HOSTNAMES};

/// Media kind accepted for upload, derived from the MIME prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `image/*` and `video/*` only; anything else has no kind.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else if content_type.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media record as returned by the feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMediaDto {
    pub id: String,
    pub url: String,
    pub filename: Option<String>,
    /// Kept as sent; backends disagree on the timestamp format.
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl RawMediaDto {
    /// Upload time, accepting RFC 3339 or an offset-less timestamp read as UTC.
    pub fn uploaded_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.uploaded_at.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// View model for one tile of a media feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl From<RawMediaDto> for MediaItem {
    fn from(dto: RawMediaDto) -> Self {
        MediaItem {
            id: dto.id,
            src: dto.url,
            alt: dto.filename,
            width: dto.width,
            height: dto.height,
        }
    }
}

impl MediaItem {
    /// True when `src` points at a hosted video player (rendered as an embed, not an image).
    pub fn is_embedded_video(&self) -> bool {
        match url::Url::parse(&self.src) {
            Ok(url) => {
                url.host_str()
                    .is_some_and(|host| MEDIA_DELIVERY_HOSTNAMES.contains(&host))
                    && url.path().contains(MEDIA_DELIVERY_EMBED_SEGMENT)
            }
            Err(_) => false,
        }
    }

    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alt.as_deref().unwrap_or(fallback)
    }
}
