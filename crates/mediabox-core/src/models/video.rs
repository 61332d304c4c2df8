use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Numeric processing status reported by the video status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatusCode {
    Queued,
    Processing,
    Encoding,
    Finished,
    ResolutionFinished,
    Failed,
    PresignedUploadStarted,
    PresignedUploadFinished,
    PresignedUploadFailed,
    CaptionsGenerated,
    TitleOrDescriptionGenerated,
    Unknown(i64),
}

impl VideoStatusCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => VideoStatusCode::Queued,
            1 => VideoStatusCode::Processing,
            2 => VideoStatusCode::Encoding,
            3 => VideoStatusCode::Finished,
            4 => VideoStatusCode::ResolutionFinished,
            5 => VideoStatusCode::Failed,
            6 => VideoStatusCode::PresignedUploadStarted,
            7 => VideoStatusCode::PresignedUploadFinished,
            8 => VideoStatusCode::PresignedUploadFailed,
            9 => VideoStatusCode::CaptionsGenerated,
            10 => VideoStatusCode::TitleOrDescriptionGenerated,
            other => VideoStatusCode::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            VideoStatusCode::Queued => 0,
            VideoStatusCode::Processing => 1,
            VideoStatusCode::Encoding => 2,
            VideoStatusCode::Finished => 3,
            VideoStatusCode::ResolutionFinished => 4,
            VideoStatusCode::Failed => 5,
            VideoStatusCode::PresignedUploadStarted => 6,
            VideoStatusCode::PresignedUploadFinished => 7,
            VideoStatusCode::PresignedUploadFailed => 8,
            VideoStatusCode::CaptionsGenerated => 9,
            VideoStatusCode::TitleOrDescriptionGenerated => 10,
            VideoStatusCode::Unknown(code) => *code,
        }
    }

    /// Whether polling should stop at this status.
    ///
    /// Presigned-upload and metadata-generation codes describe side steps of
    /// the pipeline and never end polling on their own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatusCode::Finished | VideoStatusCode::Failed)
    }
}

impl Display for VideoStatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoStatusCode::Queued => write!(f, "QUEUED"),
            VideoStatusCode::Processing => write!(f, "PROCESSING"),
            VideoStatusCode::Encoding => write!(f, "ENCODING"),
            VideoStatusCode::Finished => write!(f, "FINISHED"),
            VideoStatusCode::ResolutionFinished => write!(f, "RESOLUTION_FINISHED"),
            VideoStatusCode::Failed => write!(f, "FAILED"),
            VideoStatusCode::PresignedUploadStarted => write!(f, "PRESIGNED_UPLOAD_STARTED"),
            VideoStatusCode::PresignedUploadFinished => write!(f, "PRESIGNED_UPLOAD_FINISHED"),
            VideoStatusCode::PresignedUploadFailed => write!(f, "PRESIGNED_UPLOAD_FAILED"),
            VideoStatusCode::CaptionsGenerated => write!(f, "CAPTIONS_GENERATED"),
            VideoStatusCode::TitleOrDescriptionGenerated => {
                write!(f, "TITLE_OR_DESCRIPTION_GENERATED")
            }
            VideoStatusCode::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

impl Serialize for VideoStatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for VideoStatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(VideoStatusCode::from_code)
    }
}

/// One status observation: numeric code plus the backend's human-readable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStatus {
    pub code: VideoStatusCode,
    #[serde(default)]
    pub name: String,
}

impl Display for VideoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.name.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Body of `GET /media/video/get-status/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusResponse {
    pub status: VideoStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_table() {
        for code in 0..=10 {
            assert_eq!(VideoStatusCode::from_code(code).code(), code);
        }
        assert_eq!(VideoStatusCode::from_code(3), VideoStatusCode::Finished);
        assert_eq!(VideoStatusCode::from_code(42), VideoStatusCode::Unknown(42));
    }

    #[test]
    fn test_terminal_codes() {
        assert!(VideoStatusCode::Finished.is_terminal());
        assert!(VideoStatusCode::Failed.is_terminal());
        assert!(!VideoStatusCode::Encoding.is_terminal());
        assert!(!VideoStatusCode::PresignedUploadFailed.is_terminal());
        assert!(!VideoStatusCode::Unknown(99).is_terminal());
    }

    #[test]
    fn test_status_response_parsing() {
        let body: VideoStatusResponse =
            serde_json::from_str(r#"{"status":{"code":2,"name":"Encoding"}}"#).unwrap();
        assert_eq!(body.status.code, VideoStatusCode::Encoding);
        assert_eq!(body.status.to_string(), "Encoding");

        let unnamed: VideoStatusResponse =
            serde_json::from_str(r#"{"status":{"code":0}}"#).unwrap();
        assert_eq!(unnamed.status.to_string(), "QUEUED");
    }
}
