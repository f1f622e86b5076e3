use super::ImageTranscoder;
use crate::models::{Fit, OutputFormat, ResizeOptions};
use crate::{Error, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Resizes with the `image` crate on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer {
    filter: Option<FilterType>,
}

impl ImageResizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = Some(filter);
        self
    }

    fn scaled(source: u32, target: u32, other: u32) -> u32 {
        ((other as f64 * target as f64 / source as f64).round() as u32).max(1)
    }

    fn resize_sync(
        image_data: Vec<u8>,
        options: ResizeOptions,
        filter: FilterType,
    ) -> Result<Vec<u8>> {
        let format = match options.format {
            Some(format) => output_format(format),
            None => image::guess_format(&image_data)?,
        };
        let img = image::load_from_memory(&image_data)?;
        let (src_w, src_h) = img.dimensions();

        let no_upscale_needed = options.width.map_or(true, |w| w >= src_w)
            && options.height.map_or(true, |h| h >= src_h);

        let resized = if options.without_enlargement && no_upscale_needed {
            tracing::debug!("Skipping resize: {}x{} already fits", src_w, src_h);
            img
        } else {
            match (options.width, options.height) {
                (Some(w), None) => img.resize_exact(w, Self::scaled(src_w, w, src_h), filter),
                (None, Some(h)) => img.resize_exact(Self::scaled(src_h, h, src_w), h, filter),
                (Some(w), Some(h)) => match options.fit.unwrap_or_default() {
                    Fit::Cover => img.resize_to_fill(w, h, filter),
                    Fit::Fill => img.resize_exact(w, h, filter),
                    Fit::Inside => img.resize(w, h, filter),
                    Fit::Outside => {
                        let scale = (w as f64 / src_w as f64).max(h as f64 / src_h as f64);
                        img.resize_exact(
                            ((src_w as f64 * scale).round() as u32).max(1),
                            ((src_h as f64 * scale).round() as u32).max(1),
                            filter,
                        )
                    }
                },
                (None, None) => img,
            }
        };

        encode(resized, format)
    }
}

fn output_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Webp => ImageFormat::WebP,
        OutputFormat::Gif => ImageFormat::Gif,
    }
}

fn join_failure(e: tokio::task::JoinError) -> Error {
    Error::Transcode(image::ImageError::IoError(std::io::Error::other(format!(
        "Image transcoding task failed: {}",
        e
    ))))
}

fn encode(image: DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    // JPEG has no alpha channel; WebP and GIF encoders want 8-bit RGBA.
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        ImageFormat::WebP | ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => image,
    };

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

#[async_trait]
impl ImageTranscoder for ImageResizer {
    async fn resize(&self, image_data: &[u8], options: &ResizeOptions) -> Result<Vec<u8>> {
        let filter = self.filter.unwrap_or(FilterType::Lanczos3);
        let output = tokio::task::spawn_blocking({
            let image_data = image_data.to_vec();
            let options = options.clone();
            move || Self::resize_sync(image_data, options, filter)
        })
        .await
        .map_err(join_failure)??;

        tracing::debug!(
            "Transcoded image from {} to {} bytes",
            image_data.len(),
            output.len()
        );
        Ok(output)
    }
}
