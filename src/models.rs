//! Data models and structures
//!
//! Defines credentials and configuration, the caller-facing upload inputs,
//! and the request/response shapes exchanged with the media service.

use crate::sign::SignatureAlgorithm;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RESIZE_WIDTH: u32 = 800;

/// Account credentials. Set once, never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl UploadCredentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Parses `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("cloudinary://")
            .ok_or_else(|| Error::Config("CLOUDINARY_URL must start with cloudinary://".into()))?;
        let (auth, host) = rest
            .rsplit_once('@')
            .ok_or_else(|| Error::Config("CLOUDINARY_URL is missing '@<cloud_name>'".into()))?;
        let (api_key, api_secret) = auth
            .split_once(':')
            .ok_or_else(|| Error::Config("CLOUDINARY_URL is missing '<key>:<secret>'".into()))?;
        let cloud_name = host.split(['?', '/']).next().unwrap_or_default();

        let credentials = Self::new(cloud_name, api_key, api_secret);
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cloud_name", &self.cloud_name),
            ("api_key", &self.api_key),
            ("api_secret", &self.api_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for UploadCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: UploadCredentials,
    pub api_base_url: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub timeout_secs: u64,
}

impl Config {
    pub fn new(credentials: UploadCredentials) -> Self {
        Self {
            credentials,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `CLOUDINARY_URL` wins over the
    /// individual credential variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match lookup("CLOUDINARY_URL").filter(|v| !v.is_empty()) {
            Some(url) => UploadCredentials::from_url(&url)?,
            None => {
                let required = |key: &str| {
                    lookup(key).ok_or_else(|| Error::Config(format!("{} not set", key)))
                };
                let credentials = UploadCredentials::new(
                    required("CLOUDINARY_CLOUD_NAME")?,
                    required("CLOUDINARY_API_KEY")?,
                    required("CLOUDINARY_API_SECRET")?,
                );
                credentials.validate()?;
                credentials
            }
        };

        let signature_algorithm = match lookup("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Some(value) => value.parse()?,
            None => SignatureAlgorithm::default(),
        };

        let timeout_secs = match lookup("CLOUDINARY_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|_| {
                Error::Config(format!("CLOUDINARY_TIMEOUT_SECS is not a number: {}", value))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials,
            api_base_url: lookup("CLOUDINARY_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            signature_algorithm,
            timeout_secs,
        })
    }
}

/// Raw file handed in by the caller.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub buffer: Vec<u8>,
    pub mime_type: String,
}

impl FileInput {
    pub fn new(buffer: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            buffer,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Fill both dimensions, cropping the overflow.
    #[default]
    Cover,
    /// Stretch to the exact dimensions.
    Fill,
    /// Fit within both dimensions.
    Inside,
    /// Cover both dimensions without cropping.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Option<Fit>,
    #[serde(default)]
    pub without_enlargement: bool,
    pub format: Option<OutputFormat>,
}

impl ResizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn fit(mut self, fit: Fit) -> Self {
        self.fit = Some(fit);
        self
    }

    pub fn without_enlargement(mut self) -> Self {
        self.without_enlargement = true;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Options actually handed to the transcoder: width falls back to 800.
    pub fn with_defaults(&self) -> Self {
        Self {
            width: Some(self.width.unwrap_or(DEFAULT_RESIZE_WIDTH)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Image,
    Video,
    Raw,
    Auto,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
            ResourceType::Auto => "auto",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            "raw" => Ok(ResourceType::Raw),
            "auto" => Ok(ResourceType::Auto),
            other => Err(Error::InvalidInput(format!("Unknown resource type: {}", other))),
        }
    }
}

/// Caller overrides for signed upload descriptors. Both fields default to absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedUploadOptions {
    pub folder: Option<String>,
    pub eager: Option<String>,
}

impl SignedUploadOptions {
    pub fn merged_over_defaults(options: Option<Self>) -> Self {
        let defaults = Self::default();
        match options {
            Some(options) => Self {
                folder: options.folder.or(defaults.folder),
                eager: options.eager.or(defaults.eager),
            },
            None => defaults,
        }
    }
}

/// Everything a client needs to upload directly without seeing the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUploadDescriptor {
    pub url: String,
    pub public_id: String,
    pub api_key: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub signature: String,
}

/// Vendor upload parameters, forwarded verbatim as form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions(BTreeMap<String, String>);

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn public_id(self, public_id: impl Into<String>) -> Self {
        self.set("public_id", public_id)
    }

    pub fn folder(self, folder: impl Into<String>) -> Self {
        self.set("folder", folder)
    }

    pub fn resource_type(self, resource_type: ResourceType) -> Self {
        self.set("resource_type", resource_type.as_str())
    }

    pub fn tags(self, tags: &[&str]) -> Self {
        self.set("tags", tags.join(","))
    }

    pub fn eager(self, eager: impl Into<String>) -> Self {
        self.set("eager", eager)
    }

    pub fn overwrite(self, overwrite: bool) -> Self {
        self.set("overwrite", overwrite.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Endpoint resource type; the vendor default is `image`.
    pub fn target_resource_type(&self) -> Result<ResourceType> {
        match self.get("resource_type") {
            Some(value) => value.parse(),
            None => Ok(ResourceType::Image),
        }
    }
}

/// Successful upload body. Fields not modelled here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Vendor error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadApiError {
    pub message: String,
    #[serde(default)]
    pub http_code: u16,
}

impl UploadApiError {
    pub fn new(message: impl Into<String>, http_code: u16) -> Self {
        Self {
            message: message.into(),
            http_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
}
