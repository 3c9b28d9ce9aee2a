//! Image intake: validated, base64-encoded image assets.

use crate::error::{Result, TryOnError};
use base64::Engine;

/// Detects a media type from magic bytes.
///
/// Used as a fallback when a browser omits or mislabels the content type of
/// an uploaded part.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // WebP: RIFF....WEBP
    if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    None
}

/// A user-supplied image, encoded for transport.
///
/// `data` is the bare base64 payload with no data-URI prefix; `mime_type` is
/// the file's declared media type. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data: String,
    mime_type: String,
}

impl ImageAsset {
    /// Creates an asset from raw file bytes and the file's declared media type.
    ///
    /// Rejects anything whose declared type is not in the `image/` category.
    pub fn from_bytes(bytes: &[u8], declared_mime: &str) -> Result<Self> {
        if !declared_mime.starts_with("image/") {
            return Err(TryOnError::InvalidInput(format!(
                "{} is not an image media type",
                if declared_mime.is_empty() {
                    "unknown"
                } else {
                    declared_mime
                }
            )));
        }
        if bytes.is_empty() {
            return Err(TryOnError::InvalidInput("file is empty".into()));
        }

        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: declared_mime.to_string(),
        })
    }

    /// Creates an asset from a `data:<mime>;base64,<payload>` URL, the shape
    /// a browser `FileReader` produces.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| TryOnError::InvalidInput("not a data URL".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| TryOnError::InvalidInput("data URL is not base64-encoded".into()))?;

        if !mime_type.starts_with("image/") {
            return Err(TryOnError::InvalidInput(format!(
                "{mime_type} is not an image media type"
            )));
        }

        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| TryOnError::Decode(e.to_string()))?;

        Ok(Self {
            data: payload.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Returns the bare base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the declared media type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the asset as a data URL for preview rendering.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
