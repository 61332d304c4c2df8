//! Mediabox Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! pre-flight validation shared by the mediabox API client and its binaries.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientConfig, OAuthProvider};
pub use error::{ClientError, ErrorMetadata, LogLevel};
pub use validation::{validate_upload, PendingUpload};
