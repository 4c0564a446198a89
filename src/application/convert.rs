//! The validate-then-convert pipeline and the collaborator seam it calls.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{
    conversion::Conversion,
    uploads::{UploadedFile, accepted_format},
};

pub const METRIC_CONVERT_REQUESTS_TOTAL: &str = "docx2html_convert_requests_total";
pub const METRIC_CONVERSION_MS: &str = "docx2html_conversion_ms";
pub const METRIC_CONVERSION_WARNINGS_TOTAL: &str = "docx2html_conversion_warnings_total";

const SOURCE: &str = "docx2html::convert";

/// Failure reported by a document collaborator. The message is opaque text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConversionFailure {
    message: String,
}

impl ConversionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// External capability that turns a document buffer into markup.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, document: Bytes) -> Result<Conversion, ConversionFailure>;
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported upload `{original_name}` with media type `{media_type}`")]
    InvalidFileType {
        media_type: String,
        original_name: String,
    },
    #[error("document conversion failed: {0}")]
    Conversion(#[from] ConversionFailure),
}

/// Terminal outcome of one `/convert` request, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    Success,
    MissingFile,
    BadUpload,
    PayloadTooLarge,
    InvalidFileType,
    ConversionFailed,
}

impl ConvertOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConvertOutcome::Success => "success",
            ConvertOutcome::MissingFile => "missing_file",
            ConvertOutcome::BadUpload => "bad_upload",
            ConvertOutcome::PayloadTooLarge => "payload_too_large",
            ConvertOutcome::InvalidFileType => "invalid_file_type",
            ConvertOutcome::ConversionFailed => "conversion_failed",
        }
    }
}

pub fn record_outcome(outcome: ConvertOutcome) {
    counter!(METRIC_CONVERT_REQUESTS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Validates uploads and hands accepted ones to the collaborator.
#[derive(Clone)]
pub struct ConvertService {
    converter: Arc<dyn DocumentConverter>,
}

impl ConvertService {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    pub async fn convert(&self, upload: UploadedFile) -> Result<Conversion, ConvertError> {
        let Some(format) = accepted_format(&upload) else {
            record_outcome(ConvertOutcome::InvalidFileType);
            return Err(ConvertError::InvalidFileType {
                media_type: upload.media_type().to_string(),
                original_name: upload.original_name().to_string(),
            });
        };

        let size_bytes = upload.size_bytes();
        let started_at = Instant::now();
        let result = self.converter.convert(upload.into_buffer()).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_CONVERSION_MS).record(elapsed_ms);

        match result {
            Ok(conversion) => {
                record_outcome(ConvertOutcome::Success);
                counter!(METRIC_CONVERSION_WARNINGS_TOTAL)
                    .increment(conversion.warnings.len() as u64);
                info!(
                    target = SOURCE,
                    format = ?format,
                    size_bytes,
                    elapsed_ms,
                    warnings = conversion.warnings.len(),
                    "document converted"
                );
                Ok(conversion)
            }
            Err(failure) => {
                record_outcome(ConvertOutcome::ConversionFailed);
                warn!(
                    target = SOURCE,
                    format = ?format,
                    size_bytes,
                    elapsed_ms,
                    error = %failure,
                    "document conversion failed"
                );
                Err(ConvertError::Conversion(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::conversion::Warning;

    struct Recording {
        calls: AtomicUsize,
        outcome: Result<Conversion, ConversionFailure>,
    }

    #[async_trait]
    impl DocumentConverter for Recording {
        async fn convert(&self, _document: Bytes) -> Result<Conversion, ConversionFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn service(outcome: Result<Conversion, ConversionFailure>) -> (ConvertService, Arc<Recording>) {
        let converter = Arc::new(Recording {
            calls: AtomicUsize::new(0),
            outcome,
        });
        (ConvertService::new(converter.clone()), converter)
    }

    fn upload(media_type: &str, name: &str) -> UploadedFile {
        UploadedFile::new(Bytes::from_static(b"PK\x03\x04"), media_type, name, 1024)
            .expect("upload within limit")
    }

    #[tokio::test]
    async fn rejected_upload_never_reaches_converter() {
        let (service, converter) = service(Ok(Conversion::default()));
        let err = service
            .convert(upload("image/png", "photo.png"))
            .await
            .expect_err("png must be rejected");

        assert!(matches!(err, ConvertError::InvalidFileType { .. }));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn warnings_keep_collaborator_order() {
        let warnings = vec![
            Warning::warning("second paragraph style"),
            Warning::warning("first image"),
            Warning::warning("another"),
        ];
        let (service, converter) =
            service(Ok(Conversion::new("<p>hi</p>", warnings.clone())));

        let conversion = service
            .convert(upload("text/plain", "notes.docx"))
            .await
            .expect("conversion succeeds");

        assert_eq!(conversion.markup, "<p>hi</p>");
        assert_eq!(conversion.warnings, warnings);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn collaborator_failure_keeps_message() {
        let (service, _) = service(Err(ConversionFailure::new("corrupt archive")));
        let err = service
            .convert(upload("text/plain", "broken.docx"))
            .await
            .expect_err("failure propagates");

        match err {
            ConvertError::Conversion(failure) => assert_eq!(failure.message(), "corrupt archive"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
