//! JSON error envelope shared by every route.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;

pub const ROUTE_NOT_FOUND: &str = "Route not found";

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    source: &'static str,
    status: StatusCode,
    message: String,
    details: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(source: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            source,
            status,
            message: message.into(),
            details: None,
            report: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new("docx2html::http::fallback", StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
    }

    /// Client-visible `details` string.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Server-side diagnostics; never serialized.
    pub fn with_report(mut self, report: ErrorReport) -> Self {
        self.report = Some(report);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                self.source,
                self.status,
                self.details.clone().unwrap_or_else(|| self.message.clone()),
            )
        });
        let body = ErrorEnvelope {
            error: self.message,
            details: self.details,
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

pub(super) async fn route_not_found() -> ApiError {
    ApiError::not_found()
}
