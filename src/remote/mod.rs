//! Remote media service integration
//!
//! Talks to the Cloudinary-style upload and admin endpoints. Credentials are
//! passed explicitly on every call; clients hold no account state.

pub mod client;
pub mod mock;

pub use client::CloudinaryClient;
pub use mock::{MockMediaApi, RecordedUpload};

use crate::models::{PingResponse, UploadCredentials, UploadOptions, UploadResponse};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MediaApi: Send + Sync {
    /// Sends `data` to the upload endpoint with `options` as form fields.
    async fn upload(
        &self,
        credentials: &UploadCredentials,
        data: &[u8],
        options: &UploadOptions,
    ) -> Result<UploadResponse>;

    async fn ping(&self, credentials: &UploadCredentials) -> Result<PingResponse>;
}
