use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use media_uploader::image::ImageResizer;
use media_uploader::mime;
use media_uploader::models::{
    Config, FileInput, ResizeOptions, ResourceType, SignedUploadOptions, UploadCredentials,
    UploadOptions,
};
use media_uploader::remote::MockMediaApi;
use media_uploader::{AdapterServices, MediaUploadModule};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "media-uploader")]
#[command(about = "Upload media and issue signed upload parameters")]
struct CliArgs {
    /// Use an in-memory remote instead of the real service.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check connectivity and credentials.
    Ping,
    /// Upload a local file.
    Upload {
        path: PathBuf,
        /// Declared MIME type; sniffed from the file contents when omitted.
        #[arg(long)]
        mime_type: Option<String>,
        #[arg(long)]
        public_id: Option<String>,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, value_parser = parse_resource_type)]
        resource_type: Option<ResourceType>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Resize images to this width before uploading.
        #[arg(long)]
        width: Option<u32>,
        /// Resize images to this height before uploading.
        #[arg(long)]
        height: Option<u32>,
    },
    /// Print signed parameters for a direct client upload.
    Sign {
        public_id: String,
        #[arg(long, default_value = "image", value_parser = parse_resource_type)]
        resource_type: ResourceType,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        eager: Option<String>,
    },
}

fn parse_resource_type(input: &str) -> std::result::Result<ResourceType, String> {
    input.parse().map_err(|_| {
        format!(
            "Invalid resource type '{}'. Expected one of: image, video, raw, auto",
            input
        )
    })
}

async fn read_input(path: &Path, mime_type: Option<String>) -> Result<FileInput> {
    let buffer = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = mime_type.unwrap_or_else(|| mime::detect(&buffer).to_string());
    Ok(FileInput::new(buffer, mime_type))
}

fn build_module(dry_run: bool) -> Result<MediaUploadModule> {
    if !dry_run {
        return Ok(MediaUploadModule::register_from_env()?);
    }

    info!("DRY_RUN enabled, uploads stay in memory");
    let config = Config::from_env().unwrap_or_else(|_| {
        Config::new(UploadCredentials::new("dry-run", "dry-run", "dry-run"))
    });
    Ok(MediaUploadModule::register_with_services(
        AdapterServices {
            api: Box::new(MockMediaApi::new()),
            transcoder: Box::new(ImageResizer::new()),
        },
        config,
    )?)
}

async fn run(args: CliArgs) -> Result<()> {
    let module = build_module(args.dry_run)?;
    let adapter = module.adapter();

    match args.command {
        Command::Ping => {
            module.on_module_init().await?;
        }
        Command::Upload {
            path,
            mime_type,
            public_id,
            folder,
            resource_type,
            tags,
            width,
            height,
        } => {
            let file = read_input(&path, mime_type).await?;

            let mut options = UploadOptions::new();
            if let Some(public_id) = public_id {
                options = options.public_id(public_id);
            }
            if let Some(folder) = folder {
                options = options.folder(folder);
            }
            if let Some(resource_type) = resource_type {
                options = options.resource_type(resource_type);
            }
            if !tags.is_empty() {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                options = options.tags(&tags);
            }

            let resize = (width.is_some() || height.is_some()).then(|| ResizeOptions {
                width,
                height,
                ..Default::default()
            });

            let response = adapter
                .upload_file(&file, Some(options), resize.as_ref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Sign {
            public_id,
            resource_type,
            folder,
            eager,
        } => {
            let descriptor = adapter.create_signed_upload_url(
                &public_id,
                resource_type,
                Some(SignedUploadOptions { folder, eager }),
            )?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
