//! Response header snapshot used for filtering and naming.

use std::fmt;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName};

use super::constants::{IMAGE_CONTENT_TYPES, MIN_IMAGE_BYTES};

/// The headers of an image response that drive filtering and naming.
///
/// Captured before any body byte is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// MIME type, lowercased and without parameters.
    pub content_type: Option<String>,
    /// Advertised body size in bytes.
    pub content_length: Option<u64>,
    /// Raw `Content-Disposition` value.
    pub content_disposition: Option<String>,
}

/// Why an image was skipped without being treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Advertised size is below [`MIN_IMAGE_BYTES`].
    TooSmall {
        /// Advertised size.
        bytes: u64,
    },
    /// Missing or unrecognized `Content-Type`.
    NotAnImage {
        /// The type the server sent, if any.
        content_type: Option<String>,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { bytes } => write!(f, "too small ({bytes} bytes)"),
            Self::NotAnImage {
                content_type: Some(content_type),
            } => write!(f, "not an image ({content_type})"),
            Self::NotAnImage { content_type: None } => write!(f, "no content type"),
        }
    }
}

impl std::error::Error for Rejection {}

impl ContentDescriptor {
    /// Reads the descriptor from response headers.
    ///
    /// Values that are not visible ASCII, or a non-numeric length, count as absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            content_type: header_text(headers, &CONTENT_TYPE).map(normalize_mime),
            content_length: header_text(headers, &CONTENT_LENGTH)
                .and_then(|value| value.parse().ok()),
            content_disposition: header_text(headers, &CONTENT_DISPOSITION).map(str::to_string),
        }
    }

    /// Applies the size filter, then the type filter.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] reason when the response should be skipped.
    pub fn screen(&self) -> Result<(), Rejection> {
        if let Some(bytes) = self.content_length
            && bytes < MIN_IMAGE_BYTES
        {
            return Err(Rejection::TooSmall { bytes });
        }

        match self.content_type.as_deref() {
            Some(mime) if IMAGE_CONTENT_TYPES.contains(&mime) => Ok(()),
            other => Err(Rejection::NotAnImage {
                content_type: other.map(str::to_string),
            }),
        }
    }

    /// Extension derived from the MIME subtype, with `jpeg` shortened to `jpg`.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let subtype = self.content_type.as_deref()?.split_once('/')?.1;
        if subtype.is_empty() {
            return None;
        }
        Some(subtype.replace("jpeg", "jpg"))
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn normalize_mime(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
