//! Error mapping for the convert route.

use axum::http::StatusCode;
use thiserror::Error;

use crate::application::convert::{ConvertError, ConvertOutcome};
use crate::application::error::ErrorReport;
use crate::infra::http::error::ApiError;

const SOURCE: &str = "docx2html::http::convert";

pub const MISSING_FILE_MESSAGE: &str =
    "No file supplied. Use the 'file' field in multipart/form-data.";
pub const INVALID_FORM_MESSAGE: &str = "Upload form data was invalid.";
pub const INVALID_TYPE_MESSAGE: &str = "Invalid file type. Upload a .docx document.";
pub const CONVERSION_FAILED_MESSAGE: &str = "Internal error while converting the file.";

/// Why the receiver could not produce an upload.
#[derive(Debug, Error)]
pub enum UploadPayloadError {
    #[error("request is not multipart/form-data: {detail}")]
    NotMultipart { detail: String },
    #[error("multipart form has no `file` field")]
    Missing,
    #[error("upload exceeds the limit of {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: u64 },
    #[error("multipart body is malformed: {detail}")]
    InvalidFormData { detail: String },
}

impl UploadPayloadError {
    pub fn outcome(&self) -> ConvertOutcome {
        match self {
            UploadPayloadError::NotMultipart { .. } | UploadPayloadError::Missing => {
                ConvertOutcome::MissingFile
            }
            UploadPayloadError::PayloadTooLarge { .. } => ConvertOutcome::PayloadTooLarge,
            UploadPayloadError::InvalidFormData { .. } => ConvertOutcome::BadUpload,
        }
    }

    pub(super) fn into_api_error(self) -> ApiError {
        let (status, message) = match &self {
            UploadPayloadError::NotMultipart { .. } | UploadPayloadError::Missing => {
                (StatusCode::BAD_REQUEST, MISSING_FILE_MESSAGE.to_string())
            }
            UploadPayloadError::PayloadTooLarge { limit_bytes } => {
                let limit_mib = limit_bytes.div_ceil(1_048_576);
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("File is too large (limit is {limit_mib} MiB)."),
                )
            }
            UploadPayloadError::InvalidFormData { .. } => {
                (StatusCode::BAD_REQUEST, INVALID_FORM_MESSAGE.to_string())
            }
        };
        let report = ErrorReport::from_error(SOURCE, status, &self);
        ApiError::new(SOURCE, status, message).with_report(report)
    }
}

pub(super) fn convert_error(err: ConvertError) -> ApiError {
    match &err {
        ConvertError::InvalidFileType { .. } => {
            let report = ErrorReport::from_error(SOURCE, StatusCode::BAD_REQUEST, &err);
            ApiError::new(SOURCE, StatusCode::BAD_REQUEST, INVALID_TYPE_MESSAGE).with_report(report)
        }
        ConvertError::Conversion(failure) => {
            let report = ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, &err);
            ApiError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                CONVERSION_FAILED_MESSAGE,
            )
            .with_details(failure.message())
            .with_report(report)
        }
    }
}
