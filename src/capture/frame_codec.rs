use anyhow::{Context, Result};
use base64::Engine;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView, ImageFormat};

const JPEG_QUALITY: u8 = 85;
const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Sniffs the magic bytes only; nothing is decoded.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
}

/// Passes JPEG frames through untouched and re-encodes anything else as JPEG.
pub fn ensure_jpeg(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if is_jpeg(&bytes) {
        return Ok(bytes);
    }
    let img = image::load_from_memory(&bytes).context("frame is not a decodable image")?;
    encode_jpeg(&img)
}

/// Shrinks the frame to fit `max_edge` and returns it as a JPEG data URL.
pub fn thumbnail_data_url(jpeg: &[u8], max_edge: u32) -> Result<String> {
    let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
        .context("failed to decode frame for thumbnail")?;

    let (width, height) = img.dimensions();
    let max_edge = max_edge.max(1);
    let thumb = if width > max_edge || height > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(encode_jpeg(&thumb)?);
    Ok(format!("{DATA_URL_PREFIX}{encoded}"))
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&img.to_rgb8())
        .context("failed to encode JPEG")?;
    Ok(out)
}
