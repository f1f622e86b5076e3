use media_uploader::{
    image::{ImageResizer, MockImageTranscoder},
    models::{
        Config, FileInput, ResizeOptions, ResourceType, SignedUploadOptions, UploadApiError,
        UploadCredentials, UploadOptions,
    },
    remote::{CloudinaryClient, MockMediaApi},
    sign::{api_sign_request, SignatureAlgorithm},
    AdapterServices, MediaUploadAdapter, MediaUploadModule,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> UploadCredentials {
    UploadCredentials::new("demo", "123456", "secret")
}

fn config_for(server: &MockServer) -> Config {
    Config {
        api_base_url: server.uri(),
        timeout_secs: 5,
        ..Config::new(credentials())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_upload_over_http_with_real_resizer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "public_id": "banner",
            "width": 800,
            "height": 100,
            "format": "png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = MediaUploadAdapter::new(config_for(&server)).unwrap();
    let file = FileInput::new(png(1600, 200), "image/png");

    let response = adapter
        .upload_file(
            &file,
            Some(UploadOptions::new().public_id("banner")),
            Some(&ResizeOptions::new()),
        )
        .await
        .unwrap();

    assert_eq!(response.public_id, "banner");
    assert_eq!(response.width, Some(800));
}

#[tokio::test]
async fn test_resizer_output_is_what_gets_uploaded() {
    let api = MockMediaApi::new();
    let adapter = MediaUploadAdapter::with_services(
        AdapterServices {
            api: Box::new(api.clone()),
            transcoder: Box::new(ImageResizer::new()),
        },
        Config::new(credentials()),
    )
    .unwrap();

    adapter
        .upload_file(
            &FileInput::new(png(1000, 500), "image/png"),
            None,
            Some(&ResizeOptions::new().height(100)),
        )
        .await
        .unwrap();

    // width 800 is filled in and wins over the aspect-preserving height-only path
    let uploaded = image::load_from_memory(&api.get_uploads()[0].data).unwrap();
    assert_eq!((uploaded.width(), uploaded.height()), (800, 100));
}

#[tokio::test]
async fn test_non_image_over_http_is_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/raw/upload"))
        .and(body_string_contains("plain text payload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"public_id": "notes"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transcoder = MockImageTranscoder::new();
    let adapter = MediaUploadAdapter::with_services(
        AdapterServices {
            api: Box::new(
                CloudinaryClient::new(Duration::from_secs(5))
                    .unwrap()
                    .with_base_url(server.uri()),
            ),
            transcoder: Box::new(transcoder.clone()),
        },
        Config::new(credentials()),
    )
    .unwrap();

    adapter
        .upload_file(
            &FileInput::new(b"plain text payload".to_vec(), "text/plain"),
            Some(UploadOptions::new().resource_type(ResourceType::Raw)),
            Some(&ResizeOptions::new().width(10)),
        )
        .await
        .unwrap();

    assert_eq!(transcoder.get_call_count(), 0);
}

#[tokio::test]
async fn test_vendor_error_reaches_caller() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(420).set_body_json(serde_json::json!({
            "error": { "message": "Rate Limit Exceeded" }
        })))
        .mount(&server)
        .await;

    let adapter = MediaUploadAdapter::new(config_for(&server)).unwrap();

    let err = adapter
        .upload_file(&FileInput::new(vec![1, 2, 3], "video/mp4"), None, None)
        .await
        .unwrap_err();

    assert_eq!(
        err.upload_payload(),
        Some(&UploadApiError::new("Rate Limit Exceeded", 420))
    );
}

#[tokio::test]
async fn test_startup_ping_failure_does_not_block() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1_1/demo/ping"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;

    let module = MediaUploadModule::register(config_for(&server)).unwrap();
    module.on_module_init().await.unwrap();

    // adapter remains usable afterwards
    let descriptor = module
        .adapter()
        .create_signed_upload_url("after-ping", ResourceType::Image, None)
        .unwrap();
    assert_eq!(descriptor.public_id, "after-ping");
}

#[tokio::test]
async fn test_startup_ping_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1_1/demo/ping"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let module = MediaUploadModule::register(config_for(&server)).unwrap();
    module.on_module_init().await.unwrap();
}

#[test]
fn test_descriptor_uses_configured_host_and_algorithm() {
    let adapter = MediaUploadAdapter::with_services(
        AdapterServices {
            api: Box::new(MockMediaApi::new()),
            transcoder: Box::new(MockImageTranscoder::new()),
        },
        Config {
            api_base_url: "https://api-eu.cloudinary.com".to_string(),
            signature_algorithm: SignatureAlgorithm::Sha256,
            ..Config::new(credentials())
        },
    )
    .unwrap();

    let descriptor = adapter
        .create_signed_upload_url_at(
            "abc123",
            ResourceType::Auto,
            Some(SignedUploadOptions {
                folder: Some("inbox".to_string()),
                eager: None,
            }),
            1700000000,
        )
        .unwrap();

    assert_eq!(
        descriptor.url,
        "https://api-eu.cloudinary.com/v1_1/demo/auto/upload"
    );
    assert_eq!(
        descriptor.signature,
        api_sign_request(
            [
                ("folder", Some("inbox")),
                ("public_id", Some("abc123")),
                ("timestamp", Some("1700000000")),
            ],
            "secret",
            SignatureAlgorithm::Sha256,
        )
    );
    assert_eq!(descriptor.signature.len(), 64);
}

#[tokio::test]
async fn test_adapter_shared_across_tasks() {
    let api = MockMediaApi::new();
    let adapter = Arc::new(
        MediaUploadAdapter::with_services(
            AdapterServices {
                api: Box::new(api.clone()),
                transcoder: Box::new(MockImageTranscoder::new()),
            },
            Config::new(credentials()),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move {
                adapter
                    .upload_file(&FileInput::new(vec![i], "application/octet-stream"), None, None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(api.get_upload_count(), 4);
}

#[tokio::test]
async fn test_unreachable_host_surfaces_as_upload_error() {
    let adapter = MediaUploadAdapter::new(Config {
        api_base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 5,
        ..Config::new(credentials())
    })
    .unwrap();

    let err = adapter
        .upload_file(&FileInput::new(vec![1, 2, 3], "text/plain"), None, None)
        .await
        .unwrap_err();

    assert_eq!(err.upload_payload().map(|p| p.http_code), Some(0));
}
