use super::ImageTranscoder;
use crate::models::ResizeOptions;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every call and returns a canned buffer.
#[derive(Clone)]
pub struct MockImageTranscoder {
    calls: Arc<Mutex<Vec<ResizeOptions>>>,
    output: Arc<Mutex<Option<Vec<u8>>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageTranscoder {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            output: Arc::new(Mutex::new(None)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Bytes to return instead of echoing the input back.
    pub fn with_output(self, output: Vec<u8>) -> Self {
        *self.output.lock().unwrap() = Some(output);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<ResizeOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageTranscoder for MockImageTranscoder {
    async fn resize(&self, image_data: &[u8], options: &ResizeOptions) -> Result<Vec<u8>> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Transcode(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        self.calls.lock().unwrap().push(options.clone());

        Ok(self
            .output
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| image_data.to_vec()))
    }
}
