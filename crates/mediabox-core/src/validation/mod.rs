//! Validation modules

pub mod upload;

pub use upload::{
    content_type_for_path, validate_upload, PendingUpload, MAX_IMAGE_SIZE_BYTES,
    MAX_VIDEO_SIZE_BYTES,
};
