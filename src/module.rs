//! Host integration: one shared adapter per process plus a startup hook.

use crate::adapter::{AdapterServices, MediaUploadAdapter};
use crate::models::Config;
use crate::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct MediaUploadModule {
    adapter: Arc<MediaUploadAdapter>,
}

impl MediaUploadModule {
    pub fn register(config: Config) -> Result<Self> {
        Ok(Self::from_adapter(MediaUploadAdapter::new(config)?))
    }

    pub fn register_from_env() -> Result<Self> {
        Self::register(Config::from_env()?)
    }

    pub fn register_with_services(services: AdapterServices, config: Config) -> Result<Self> {
        Ok(Self::from_adapter(MediaUploadAdapter::with_services(
            services, config,
        )?))
    }

    pub fn from_adapter(adapter: MediaUploadAdapter) -> Self {
        Self {
            adapter: Arc::new(adapter),
        }
    }

    pub fn adapter(&self) -> Arc<MediaUploadAdapter> {
        Arc::clone(&self.adapter)
    }

    /// Kicks off the connectivity check in the background and returns
    /// immediately. Awaiting the handle is optional.
    pub fn on_module_init(&self) -> JoinHandle<()> {
        let adapter = self.adapter();
        tokio::spawn(async move { adapter.ping_remote().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MockImageTranscoder;
    use crate::models::UploadCredentials;
    use crate::remote::MockMediaApi;

    fn module(api: &MockMediaApi) -> MediaUploadModule {
        MediaUploadModule::register_with_services(
            AdapterServices {
                api: Box::new(api.clone()),
                transcoder: Box::new(MockImageTranscoder::new()),
            },
            Config::new(UploadCredentials::new("demo", "key", "secret")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_startup_survives_ping_failure() {
        let api = MockMediaApi::new().with_ping_failure(true);
        let module = module(&api);

        module.on_module_init().await.unwrap();

        assert_eq!(api.get_ping_count(), 1);
    }

    #[tokio::test]
    async fn test_adapter_is_shared() {
        let module = module(&MockMediaApi::new());
        assert!(Arc::ptr_eq(&module.adapter(), &module.clone().adapter()));
    }

    #[test]
    fn test_register_rejects_blank_credentials() {
        let result = MediaUploadModule::register(Config::new(UploadCredentials::new(
            " ", "key", "secret",
        )));
        assert!(result.is_err());
    }
}
