// ============================================================================
// IMAGE I/O — upload validation/decoding and PNG/JPEG export
// ============================================================================

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canvas::ExportSize;
use crate::error::{EditorError, EditorResult};
use crate::pixel_buffer::PixelBuffer;

// ============================================================================
// UPLOAD
// ============================================================================

/// Reject anything not declared as an image before touching its bytes.
pub fn check_upload_mime(mime: &str) -> EditorResult<()> {
    let essence = mime.split(';').next().unwrap_or("").trim();
    let is_image = essence
        .split_once('/')
        .is_some_and(|(top, sub)| top.eq_ignore_ascii_case("image") && !sub.is_empty());
    if !is_image {
        return Err(EditorError::UnsupportedMimeType {
            mime: mime.to_string(),
        });
    }
    Ok(())
}

/// Validate the declared MIME type, sniff the payload, and decode to RGBA8.
pub fn decode_upload(mime: &str, bytes: &[u8]) -> EditorResult<PixelBuffer> {
    check_upload_mime(mime)?;
    let sniffed = image::guess_format(bytes).map_err(|e| EditorError::decode(e.to_string()))?;
    tracing::debug!("Upload declared {} sniffed as {:?} ({} bytes)", mime, sniffed, bytes.len());
    PixelBuffer::decode(bytes)
}

// ============================================================================
// EXPORT SETTINGS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            _ => Err(EditorError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Export quality: a named preset or a raw value in (0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quality {
    #[default]
    High,
    Medium,
    Low,
    Custom(f32),
}

impl Quality {
    pub fn custom(value: f32) -> EditorResult<Self> {
        if !(value.is_finite() && value > 0.0 && value <= 1.0) {
            return Err(EditorError::InvalidQuality(value));
        }
        Ok(Quality::Custom(value))
    }

    pub fn value(&self) -> f32 {
        match self {
            Quality::High => 1.0,
            Quality::Medium => 0.8,
            Quality::Low => 0.6,
            Quality::Custom(v) => *v,
        }
    }

    /// JPEG encoder quality on the 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.value() * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl FromStr for Quality {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            other => {
                let value: f32 = other
                    .parse()
                    .map_err(|_| EditorError::InvalidQuality(f32::NAN))?;
                Quality::custom(value)
            }
        }
    }
}

impl TryFrom<String> for Quality {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quality> for String {
    fn from(q: Quality) -> Self {
        q.to_string()
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::High => f.write_str("high"),
            Quality::Medium => f.write_str("medium"),
            Quality::Low => f.write_str("low"),
            Quality::Custom(v) => write!(f, "{}", v),
        }
    }
}

/// Everything an export needs besides the scene itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub quality: Quality,
    pub size: ExportSize,
    pub pixel_ratio: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: Quality::High,
            size: ExportSize::Canvas,
            pixel_ratio: 1.0,
        }
    }
}

/// An encoded export ready to be written or handed to a download surface.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

impl ExportedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// `<prefix>-image.<ext>`
pub fn export_file_name(prefix: &str, format: ExportFormat) -> String {
    format!("{}-image.{}", prefix, format.extension())
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode a composited buffer. PNG is lossless and ignores `quality`; JPEG
/// drops alpha and maps `quality` onto the encoder's 1..=100 scale.
pub fn encode(buffer: &PixelBuffer, format: ExportFormat, quality: Quality) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let (width, height) = buffer.dimensions();

    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes)
                .write_image(buffer.as_raw(), width, height, ColorType::Rgba8)
                .map_err(|e| EditorError::encode(e.to_string()))?;
        }
        ExportFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(buffer.as_image().clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.jpeg_quality());
            encoder
                .encode(rgb_image.as_raw(), width, height, ColorType::Rgb8)
                .map_err(|e| EditorError::encode(e.to_string()))?;
        }
    }

    tracing::debug!("Encoded {}x{} {} ({} bytes)", width, height, format, bytes.len());
    Ok(bytes)
}
