//! Uploaded document values and the acceptance rule applied before conversion.

use bytes::Bytes;

use super::error::DomainError;

/// Default ceiling for a single uploaded document.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Media type reported when a multipart part carries no `Content-Type`.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Document formats the service knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
}

impl DocumentFormat {
    /// Canonical media type for the format.
    pub const fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// File extension, including the leading dot, in lowercase.
    pub const fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => ".docx",
        }
    }
}

/// Every format accepted by [`accepted_format`].
pub const ACCEPTED_FORMATS: &[DocumentFormat] = &[DocumentFormat::Docx];

/// A file received from a multipart upload, fully buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    buffer: Bytes,
    media_type: String,
    original_name: String,
}

impl UploadedFile {
    /// Build an upload, enforcing that the buffer fits within `limit_bytes`.
    pub fn new(
        buffer: Bytes,
        media_type: impl Into<String>,
        original_name: impl Into<String>,
        limit_bytes: u64,
    ) -> Result<Self, DomainError> {
        let size = buffer.len() as u64;
        if size > limit_bytes {
            return Err(DomainError::invariant(format!(
                "upload of {size} bytes exceeds limit of {limit_bytes} bytes"
            )));
        }

        Ok(Self {
            buffer,
            media_type: media_type.into(),
            original_name: original_name.into(),
        })
    }

    pub fn into_buffer(self) -> Bytes {
        self.buffer
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.buffer.len() as u64
    }
}

/// Decide which supported format, if any, the upload should be converted as.
///
/// Clients are unreliable about `Content-Type`, so a match on either the
/// declared media type or the filename extension is enough.
pub fn accepted_format(upload: &UploadedFile) -> Option<DocumentFormat> {
    ACCEPTED_FORMATS.iter().copied().find(|format| {
        matches_media_type(*format, upload.media_type())
            || matches_extension(*format, upload.original_name())
    })
}

fn matches_media_type(format: DocumentFormat, media_type: &str) -> bool {
    media_type == format.media_type()
}

fn matches_extension(format: DocumentFormat, original_name: &str) -> bool {
    original_name
        .to_ascii_lowercase()
        .ends_with(format.extension())
}
