//! Media upload adapter for Cloudinary-style media services
//!
//! Streams file bytes (optionally resized) to the remote upload endpoint and
//! issues signed upload descriptors so clients can upload directly without
//! ever seeing the API secret.

pub mod adapter;
pub mod error;
pub mod image;
pub mod mime;
pub mod models;
pub mod module;
pub mod remote;
pub mod sign;

pub use adapter::{AdapterServices, MediaUploadAdapter};
pub use error::{Error, Result};
pub use module::MediaUploadModule;
