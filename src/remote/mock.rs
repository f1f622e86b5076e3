use super::MediaApi;
use crate::models::{
    PingResponse, UploadApiError, UploadCredentials, UploadOptions, UploadResponse,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One call observed by [`MockMediaApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub cloud_name: String,
    pub data: Vec<u8>,
    pub options: UploadOptions,
}

#[derive(Clone)]
pub struct MockMediaApi {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    upload_error: Arc<Mutex<Option<UploadApiError>>>,
    ping_failure: Arc<Mutex<bool>>,
    ping_count: Arc<Mutex<usize>>,
}

impl MockMediaApi {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            upload_error: Arc::new(Mutex::new(None)),
            ping_failure: Arc::new(Mutex::new(false)),
            ping_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Every upload fails with this payload.
    pub fn with_upload_error(self, error: UploadApiError) -> Self {
        *self.upload_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_ping_failure(self, should_fail: bool) -> Self {
        *self.ping_failure.lock().unwrap() = should_fail;
        self
    }

    pub fn get_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_ping_count(&self) -> usize {
        *self.ping_count.lock().unwrap()
    }
}

impl Default for MockMediaApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaApi for MockMediaApi {
    async fn upload(
        &self,
        credentials: &UploadCredentials,
        data: &[u8],
        options: &UploadOptions,
    ) -> Result<UploadResponse> {
        if let Some(error) = self.upload_error.lock().unwrap().clone() {
            return Err(Error::Upload(error));
        }

        self.uploads.lock().unwrap().push(RecordedUpload {
            cloud_name: credentials.cloud_name.clone(),
            data: data.to_vec(),
            options: options.clone(),
        });

        let resource_type = options.target_resource_type()?;
        let public_id = match (options.get("public_id"), options.get("folder")) {
            (Some(id), Some(folder)) => format!("{}/{}", folder, id),
            (Some(id), None) => id.to_string(),
            (None, Some(folder)) => format!("{}/{}", folder, Uuid::new_v4().simple()),
            (None, None) => Uuid::new_v4().simple().to_string(),
        };

        Ok(UploadResponse {
            secure_url: Some(format!(
                "https://res.cloudinary.com/{}/{}/upload/{}",
                credentials.cloud_name, resource_type, public_id
            )),
            public_id,
            version: Some(1),
            resource_type: Some(resource_type.to_string()),
            bytes: Some(data.len() as u64),
            ..Default::default()
        })
    }

    async fn ping(&self, _credentials: &UploadCredentials) -> Result<PingResponse> {
        *self.ping_count.lock().unwrap() += 1;

        if *self.ping_failure.lock().unwrap() {
            return Err(Error::Connectivity("Mock ping failure".to_string()));
        }

        Ok(PingResponse {
            status: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> UploadCredentials {
        UploadCredentials::new("demo", "key", "secret")
    }

    #[tokio::test]
    async fn test_mock_records_upload() {
        let api = MockMediaApi::new();

        let response = api
            .upload(
                &credentials(),
                b"bytes",
                &UploadOptions::new().public_id("cat").folder("pets"),
            )
            .await
            .unwrap();

        assert_eq!(response.public_id, "pets/cat");
        assert_eq!(
            response.secure_url.as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/pets/cat")
        );
        assert_eq!(api.get_upload_count(), 1);
        assert_eq!(api.get_uploads()[0].data, b"bytes");
    }

    #[tokio::test]
    async fn test_mock_generates_public_id() {
        let api = MockMediaApi::new();

        let first = api
            .upload(&credentials(), b"a", &UploadOptions::new())
            .await
            .unwrap();
        let second = api
            .upload(&credentials(), b"b", &UploadOptions::new())
            .await
            .unwrap();

        assert_ne!(first.public_id, second.public_id);
    }

    #[tokio::test]
    async fn test_mock_upload_error() {
        let payload = UploadApiError::new("File size too large", 400);
        let api = MockMediaApi::new().with_upload_error(payload.clone());

        let err = api
            .upload(&credentials(), b"a", &UploadOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.upload_payload(), Some(&payload));
        assert_eq!(api.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_ping() {
        let api = MockMediaApi::new();
        assert_eq!(api.ping(&credentials()).await.unwrap().status, "ok");

        let failing = MockMediaApi::new().with_ping_failure(true);
        assert!(failing.ping(&credentials()).await.is_err());
        assert_eq!(failing.get_ping_count(), 1);
    }
}
