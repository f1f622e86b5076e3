//! Image transcoding ahead of upload
//!
//! Resizes and re-encodes image buffers so large originals are shrunk
//! before they are sent to the media service.

pub mod mock;
pub mod processor;

pub use mock::MockImageTranscoder;
pub use processor::ImageResizer;

use crate::models::ResizeOptions;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageTranscoder: Send + Sync {
    /// Returns the re-encoded bytes. `options` are used as given; defaults
    /// are applied by the caller.
    async fn resize(&self, image_data: &[u8], options: &ResizeOptions) -> Result<Vec<u8>>;
}
