//! `data:` URI encoding for images
//!
//! Uploaded reference images and generated covers are stored inside the
//! book as `data:<mime>;base64,<payload>` strings. Before an image is sent
//! to the provider it is split back into MIME type and raw bytes here, so a
//! malformed upload fails locally instead of on the network.

use crate::error::{Result, StudioError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// MIME type of every generated cover
pub const PNG_MIME_TYPE: &str = "image/png";

/// A decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Wraps PNG bytes
    pub fn png(data: Vec<u8>) -> Self {
        Self::new(PNG_MIME_TYPE, data)
    }

    /// Parses `data:<mime>;base64,<payload>`
    ///
    /// The MIME type is whatever sits between the first `:` and the
    /// following `;` of the header. Both it and the payload must be present.
    pub fn parse(uri: &str) -> Result<Self> {
        let (header, payload) = uri.split_once(',').ok_or_else(|| StudioError::InvalidDataUri {
            reason: "missing ',' separator".to_string(),
        })?;

        let mime_type = header
            .split_once(':')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(mime, _)| mime.trim())
            .filter(|mime| !mime.is_empty())
            .ok_or_else(|| StudioError::InvalidDataUri {
                reason: "no MIME type in header".to_string(),
            })?;

        let payload = payload.trim();
        if payload.is_empty() {
            return Err(StudioError::InvalidDataUri {
                reason: "empty payload".to_string(),
            });
        }

        let data = STANDARD
            .decode(payload)
            .map_err(|e| StudioError::InvalidDataUri {
                reason: format!("payload is not base64: {}", e),
            })?;

        Ok(Self::new(mime_type, data))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the base64 payload without the header
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.base64_payload())
    }
}

/// Maps an image file extension to the MIME types accepted for cover uploads
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
