//! The upload adapter exposed to host applications.

use crate::image::{ImageResizer, ImageTranscoder};
use crate::models::{
    Config, FileInput, ResizeOptions, ResourceType, SignedUploadDescriptor, SignedUploadOptions,
    UploadCredentials, UploadOptions, UploadResponse,
};
use crate::remote::{CloudinaryClient, MediaApi};
use crate::sign::{api_sign_request, SignatureAlgorithm};
use crate::{mime, Error, Result};
use chrono::Utc;
use std::borrow::Cow;
use tracing::{debug, error, info, warn};

/// Uploads files to the media service and issues signed upload descriptors.
///
/// Holds its own immutable credentials and passes them explicitly to every
/// remote call, so differently configured adapters can run side by side.
pub struct MediaUploadAdapter {
    credentials: UploadCredentials,
    api_base_url: String,
    signature_algorithm: SignatureAlgorithm,
    api: Box<dyn MediaApi>,
    transcoder: Box<dyn ImageTranscoder>,
}

/// Injectable collaborators used to construct [`MediaUploadAdapter`] in tests/harnesses.
pub struct AdapterServices {
    pub api: Box<dyn MediaApi>,
    pub transcoder: Box<dyn ImageTranscoder>,
}

impl MediaUploadAdapter {
    /// Build an adapter backed by the HTTP client and the `image` crate resizer.
    pub fn new(config: Config) -> Result<Self> {
        let api = CloudinaryClient::from_config(&config)?;
        Self::with_services(
            AdapterServices {
                api: Box::new(api),
                transcoder: Box::new(ImageResizer::new()),
            },
            config,
        )
    }

    /// Build an adapter from concrete collaborators.
    pub fn with_services(services: AdapterServices, config: Config) -> Result<Self> {
        config.credentials.validate()?;

        Ok(Self {
            credentials: config.credentials,
            api_base_url: config.api_base_url,
            signature_algorithm: config.signature_algorithm,
            api: services.api,
            transcoder: services.transcoder,
        })
    }

    pub fn credentials(&self) -> &UploadCredentials {
        &self.credentials
    }

    /// Upload `file`, resizing it first when it is an image and
    /// `resize_options` were given.
    pub async fn upload_file(
        &self,
        file: &FileInput,
        upload_options: Option<UploadOptions>,
        resize_options: Option<&ResizeOptions>,
    ) -> Result<UploadResponse> {
        if file.buffer.is_empty() {
            return Err(Error::InvalidInput("file buffer is empty".to_string()));
        }
        if !mime::is_valid(&file.mime_type) {
            return Err(Error::InvalidInput(format!(
                "invalid MIME type: {:?}",
                file.mime_type
            )));
        }

        let payload: Cow<'_, [u8]> = match resize_options {
            Some(resize) if mime::is_image(&file.mime_type) => {
                let effective = resize.with_defaults();
                debug!("Resizing {} image with {:?}", file.mime_type, effective);
                Cow::Owned(self.transcoder.resize(&file.buffer, &effective).await?)
            }
            _ => Cow::Borrowed(file.buffer.as_slice()),
        };

        let options = upload_options.unwrap_or_default();
        match self.api.upload(&self.credentials, &payload, &options).await {
            Ok(response) => {
                info!(
                    "Uploaded {} ({} bytes) as {}",
                    file.mime_type,
                    payload.len(),
                    response.public_id
                );
                Ok(response)
            }
            Err(e) => {
                error!("Upload to {} failed: {}", self.credentials.cloud_name, e);
                Err(e)
            }
        }
    }

    /// Signed parameters for a direct client-side upload, stamped with the
    /// current time. No network call is made.
    pub fn create_signed_upload_url(
        &self,
        public_id: &str,
        resource_type: ResourceType,
        options: Option<SignedUploadOptions>,
    ) -> Result<SignedUploadDescriptor> {
        let timestamp = Utc::now().timestamp();
        self.create_signed_upload_url_at(public_id, resource_type, options, timestamp)
    }

    pub fn create_signed_upload_url_at(
        &self,
        public_id: &str,
        resource_type: ResourceType,
        options: Option<SignedUploadOptions>,
        timestamp: i64,
    ) -> Result<SignedUploadDescriptor> {
        let options = SignedUploadOptions::merged_over_defaults(options);
        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base_url, self.credentials.cloud_name, resource_type
        );
        let timestamp = timestamp.to_string();

        let signature = api_sign_request(
            [
                ("timestamp", Some(timestamp.as_str())),
                ("folder", options.folder.as_deref()),
                ("eager", options.eager.as_deref()),
                ("public_id", Some(public_id)),
            ],
            &self.credentials.api_secret,
            self.signature_algorithm,
        );

        Ok(SignedUploadDescriptor {
            url,
            public_id: public_id.to_string(),
            api_key: self.credentials.api_key.clone(),
            timestamp,
            eager: options.eager,
            folder: options.folder,
            signature,
        })
    }

    /// Best-effort connectivity check. Failures are logged, never returned.
    pub async fn ping_remote(&self) {
        match self.api.ping(&self.credentials).await {
            Ok(response) => info!("Cloudinary connection {}", response.status),
            Err(e) => {
                warn!("Cloudinary connection failed.");
                error!("{}", e);
            }
        }
    }
}
