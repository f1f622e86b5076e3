use super::MediaApi;
use crate::models::{
    Config, ErrorEnvelope, PingResponse, UploadApiError, UploadCredentials, UploadOptions,
    UploadResponse, DEFAULT_API_BASE_URL,
};
use crate::sign::{api_sign_request, SignatureAlgorithm};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

/// Form fields that are never part of the signature.
const UNSIGNED_FIELDS: &[&str] = &["file", "api_key", "cloud_name", "resource_type", "timestamp"];

pub struct CloudinaryClient {
    client: Client,
    base_url: String,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Duration::from_secs(config.timeout_secs))?
            .with_base_url(config.api_base_url.clone())
            .with_signature_algorithm(config.signature_algorithm))
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    fn endpoint(&self, cloud_name: &str, path: &str) -> String {
        format!("{}/v1_1/{}/{}", self.base_url, cloud_name, path)
    }

    fn upload_form(
        &self,
        credentials: &UploadCredentials,
        data: &[u8],
        options: &UploadOptions,
        timestamp: &str,
    ) -> Form {
        let signed: Vec<(&str, &str)> = options
            .iter()
            .filter(|(key, _)| !UNSIGNED_FIELDS.contains(key))
            .collect();

        let signature = api_sign_request(
            signed
                .iter()
                .map(|(key, value)| (*key, Some(*value)))
                .chain(std::iter::once(("timestamp", Some(timestamp)))),
            &credentials.api_secret,
            self.signature_algorithm,
        );

        let file_name = options.get("public_id").unwrap_or("file").to_string();
        let mut form = Form::new()
            .part("file", Part::bytes(data.to_vec()).file_name(file_name))
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        for (key, value) in signed {
            form = form.text(key.to_string(), value.to_string());
        }
        form
    }

    async fn error_payload(response: reqwest::Response) -> UploadApiError {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) => match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) => body,
            },
            Err(e) => e.to_string(),
        };
        UploadApiError::new(message, status)
    }

    /// Every failed upload surfaces as `Error::Upload`. Transport failures have no status and use 0.
    fn upload_failure(message: String, http_code: u16) -> Error {
        tracing::error!("Upload API error (status {}): {}", http_code, message);
        Error::Upload(UploadApiError::new(message, http_code))
    }
}

#[async_trait]
impl MediaApi for CloudinaryClient {
    async fn upload(
        &self,
        credentials: &UploadCredentials,
        data: &[u8],
        options: &UploadOptions,
    ) -> Result<UploadResponse> {
        let resource_type = options.target_resource_type()?;
        let url = self.endpoint(
            &credentials.cloud_name,
            &format!("{}/upload", resource_type),
        );
        let timestamp = Utc::now().timestamp().to_string();
        let form = self.upload_form(credentials, data, options, &timestamp);

        tracing::debug!("Uploading {} bytes to {}", data.len(), url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::upload_failure(format!("Failed to send upload request: {}", e), 0))?;

        let status = response.status();
        if !status.is_success() {
            let payload = Self::error_payload(response).await;
            return Err(Self::upload_failure(payload.message, payload.http_code));
        }

        let body = response.text().await.map_err(|e| {
            Self::upload_failure(
                format!("Failed to read upload response: {}", e),
                status.as_u16(),
            )
        })?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("Unparseable upload response body: {}", body);
            Self::upload_failure(
                format!("Failed to parse upload response: {}", e),
                status.as_u16(),
            )
        })
    }

    async fn ping(&self, credentials: &UploadCredentials) -> Result<PingResponse> {
        let response = self
            .client
            .get(self.endpoint(&credentials.cloud_name, "ping"))
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            let payload = Self::error_payload(response).await;
            return Err(Error::Connectivity(format!(
                "status {}: {}",
                payload.http_code, payload.message
            )));
        }

        Ok(response.json().await?)
    }
}
