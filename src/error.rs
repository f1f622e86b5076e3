//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use crate::models::UploadApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote upload endpoint rejected the request. Carries the vendor payload.
    #[error("Upload failed (status {}): {}", .0.http_code, .0.message)]
    Upload(UploadApiError),

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    #[error("Image transcoding error: {0}")]
    Transcode(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Vendor error payload, when the failure came from the upload endpoint.
    pub fn upload_payload(&self) -> Option<&UploadApiError> {
        match self {
            Error::Upload(payload) => Some(payload),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
