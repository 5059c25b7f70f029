//! Image payloads for multimodal requests.
//!
//! Gemini accepts JPEG, PNG, WebP, HEIC and HEIF inline. Anything else
//! (GIF, BMP, …) is decoded, flattened onto white, and re-encoded as JPEG.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

const NATIVE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];
const JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("empty image body")]
    Empty,
    #[error("cannot decode {mime_type} image: {source}")]
    Decode {
        mime_type: String,
        source: image::ImageError,
    },
    #[error("JPEG encoding failed: {0}")]
    Encode(#[source] image::ImageError),
}

/// Base64 image data ready for an `inlineData` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Encode `bytes` for upload, converting to JPEG when the type is not accepted natively.
    pub fn prepare(bytes: &[u8], mime_type: &str) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let mime_type = normalize_mime(mime_type);
        if NATIVE_MIME_TYPES.contains(&mime_type.as_str()) {
            return Ok(Self {
                data: STANDARD.encode(bytes),
                mime_type,
            });
        }

        let decoded = image::load_from_memory(bytes).map_err(|source| ImageError::Decode {
            mime_type: mime_type.clone(),
            source,
        })?;
        let jpeg = to_jpeg(&decoded)?;
        debug!(from = %mime_type, bytes = jpeg.len(), "re-encoded image as JPEG");
        Ok(Self {
            mime_type: "image/jpeg".to_string(),
            data: STANDARD.encode(jpeg),
        })
    }
}

fn normalize_mime(mime_type: &str) -> String {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => base,
    }
}

fn to_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = if img.color().has_alpha() {
        flatten_on_white(img)
    } else {
        img.to_rgb8()
    };
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(ImageError::Encode)?;
    Ok(out.into_inner())
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = f32::from(px[3]) / 255.0;
        let blend = |c: u8| (f32::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encoded(format: ImageFormat, px: Rgba<u8>) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, px));
        let img = match format {
            ImageFormat::Bmp => DynamicImage::ImageRgb8(img.to_rgb8()),
            _ => img,
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn native_types_pass_through() {
        let png = encoded(ImageFormat::Png, Rgba([10, 20, 30, 255]));
        let inline = InlineImage::prepare(&png, "image/png").unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&inline.data).unwrap(), png);
    }

    #[test]
    fn mime_aliases_and_parameters_normalise() {
        let inline = InlineImage::prepare(b"\xff\xd8\xff", "Image/JPG; charset=binary").unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
    }

    #[test]
    fn bmp_is_converted_to_jpeg() {
        let bmp = encoded(ImageFormat::Bmp, Rgba([200, 100, 50, 255]));
        let inline = InlineImage::prepare(&bmp, "image/bmp").unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
        let bytes = STANDARD.decode(&inline.data).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn transparent_gif_flattens_onto_white() {
        let gif = encoded(ImageFormat::Gif, Rgba([0, 0, 0, 0]));
        let inline = InlineImage::prepare(&gif, "image/gif").unwrap();
        let bytes = STANDARD.decode(&inline.data).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let px = decoded.get_pixel(1, 1);
        assert!(px[0] > 240 && px[1] > 240 && px[2] > 240, "got {px:?}");
    }

    #[test]
    fn undecodable_bytes_fail() {
        let err = InlineImage::prepare(b"not an image", "image/gif").unwrap_err();
        assert!(matches!(err, ImageError::Decode { .. }));
    }

    #[test]
    fn empty_body_fails() {
        assert!(matches!(
            InlineImage::prepare(&[], "image/png"),
            Err(ImageError::Empty)
        ));
    }
}
