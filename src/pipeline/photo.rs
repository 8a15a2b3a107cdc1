//! Photo preparation: raw bytes → resized JPEG → base64 [`EmbeddedPhoto`].
//!
//! Every photo ends up base64-inlined in a single HTML file that the PDF
//! renderer holds in memory at once. Full-size phone photos (3–5 MB each)
//! make a 200-recipe cookbook several hundred megabytes, so photos are
//! decoded, downscaled to the print column width and re-encoded as JPEG.
//!
//! If decoding fails the original bytes are kept as long as their format
//! can be recognised; a photo the renderer cannot display is dropped.

use crate::output::EmbeddedPhoto;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

/// Decode a base64 `photo_data` field. Whitespace (line-wrapped base64)
/// and a leading `data:…;base64,` prefix are tolerated.
pub fn decode_base64_photo(data: &str) -> Option<Vec<u8>> {
    let payload = match data.find(";base64,") {
        Some(pos) if data.starts_with("data:") => &data[pos + ";base64,".len()..],
        _ => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            warn!("Discarding photo with invalid base64: {}", e);
            None
        }
    }
}

/// Prepare photo bytes for embedding.
///
/// With `optimize`, the image is converted to RGB, downscaled with Lanczos3
/// when wider than `max_width` (aspect ratio kept) and re-encoded as JPEG at
/// `quality`. Returns `None` only when the bytes are not a recognisable
/// image at all.
pub fn prepare_photo(
    bytes: &[u8],
    optimize: bool,
    max_width: u32,
    quality: u8,
) -> Option<EmbeddedPhoto> {
    if optimize {
        match optimize_photo(bytes, max_width, quality) {
            Ok(jpeg) => {
                return Some(EmbeddedPhoto {
                    mime_type: "image/jpeg".to_string(),
                    data_base64: STANDARD.encode(&jpeg),
                    optimized: true,
                })
            }
            Err(e) => warn!("Photo optimisation failed, embedding original: {}", e),
        }
    }
    passthrough(bytes)
}

/// Decode, downscale and JPEG-encode one photo.
pub fn optimize_photo(
    bytes: &[u8],
    max_width: u32,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let img = downscale(img, max_width);
    let rgb = img.to_rgb8();

    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder.encode_image(&rgb)?;
    }
    debug!(
        "Optimised photo {} → {} bytes ({}x{})",
        bytes.len(),
        buf.len(),
        rgb.width(),
        rgb.height()
    );
    Ok(buf)
}

/// Target size for an image `width`×`height` capped at `max_width`.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let ratio = max_width as f64 / width as f64;
    let new_height = ((height as f64) * ratio) as u32;
    (max_width, new_height.max(1))
}

fn downscale(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (w, h) = scaled_dimensions(img.width(), img.height(), max_width);
    if w == img.width() {
        return img;
    }
    img.resize_exact(w, h, FilterType::Lanczos3)
}

/// Embed the bytes unchanged when their format is recognisable.
fn passthrough(bytes: &[u8]) -> Option<EmbeddedPhoto> {
    let mime = match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(other) => {
            warn!("Dropping photo in unsupported format {:?}", other);
            return None;
        }
        Err(_) => {
            warn!("Dropping photo: bytes are not a recognisable image");
            return None;
        }
    };
    Some(EmbeddedPhoto {
        mime_type: mime.to_string(),
        data_base64: STANDARD.encode(bytes),
        optimized: false,
    })
}
