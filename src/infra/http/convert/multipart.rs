//! Buffers the `file` part of a multipart upload, enforcing the size cap as chunks arrive.

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::{Field, MultipartError};
use bytes::BytesMut;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::domain::uploads::{FALLBACK_MEDIA_TYPE, UploadedFile};

use super::errors::UploadPayloadError;

const SOURCE: &str = "docx2html::http::multipart";
const FILE_FIELD: &str = "file";

/// Read parts until the first `file` part carrying a filename and buffer it.
/// Text fields, including a `file` part without a filename, are skipped.
pub(super) async fn read_upload(
    multipart: &mut Multipart,
    limit_bytes: u64,
) -> Result<UploadedFile, UploadPayloadError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(classify(err, limit_bytes)),
        };

        if field.name() != Some(FILE_FIELD) {
            debug!(target = SOURCE, field = ?field.name(), "skipping form field");
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            debug!(target = SOURCE, "skipping `file` text field");
            continue;
        };
        let media_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string());

        let buffer = read_capped(field, limit_bytes).await?;
        return UploadedFile::new(buffer.freeze(), media_type, original_name, limit_bytes)
            .map_err(|_| UploadPayloadError::PayloadTooLarge { limit_bytes });
    }

    Err(UploadPayloadError::Missing)
}

async fn read_capped(mut field: Field, limit_bytes: u64) -> Result<BytesMut, UploadPayloadError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|err| classify(err, limit_bytes))?;
        let total = (buffer.len() + chunk.len()) as u64;
        if total > limit_bytes {
            warn!(
                target = SOURCE,
                limit_bytes,
                received_bytes = total,
                "upload exceeded size limit"
            );
            return Err(UploadPayloadError::PayloadTooLarge { limit_bytes });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

fn classify(err: MultipartError, limit_bytes: u64) -> UploadPayloadError {
    let status = err.status();
    warn!(
        target = SOURCE,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => UploadPayloadError::PayloadTooLarge { limit_bytes },
        _ => UploadPayloadError::InvalidFormData {
            detail: err.body_text(),
        },
    }
}
