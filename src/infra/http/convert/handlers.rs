use axum::{Json, extract::State};
use axum_extra::extract::{Multipart, multipart::MultipartRejection};
use serde::Serialize;

use crate::application::convert::record_outcome;
use crate::domain::conversion::{Conversion, Warning};
use crate::infra::http::{HttpState, error::ApiError};

use super::errors::{UploadPayloadError, convert_error};
use super::multipart::read_upload;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub html: String,
    pub warnings: Vec<Warning>,
}

impl From<Conversion> for ConvertResponse {
    fn from(conversion: Conversion) -> Self {
        Self {
            html: conversion.markup,
            warnings: conversion.warnings,
        }
    }
}

pub(crate) async fn convert_upload(
    State(state): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let limit_bytes = state.upload_limit_bytes();

    let received = match multipart {
        Ok(mut multipart) => read_upload(&mut multipart, limit_bytes).await,
        Err(rejection) => Err(UploadPayloadError::NotMultipart {
            detail: rejection.body_text(),
        }),
    };
    let upload = received.map_err(|err| {
        record_outcome(err.outcome());
        err.into_api_error()
    })?;

    let conversion = state.convert.convert(upload).await.map_err(convert_error)?;
    Ok(Json(conversion.into()))
}
