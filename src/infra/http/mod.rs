mod convert;
mod error;
mod health;
mod middleware;

pub use error::{ApiError, ErrorEnvelope, ROUTE_NOT_FOUND};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::application::convert::ConvertService;
use crate::config::Settings;

use self::middleware::{log_responses, set_request_context};

/// Slack on top of the file limit for multipart boundaries and part headers.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct HttpState {
    pub convert: ConvertService,
    pub settings: Arc<Settings>,
}

impl HttpState {
    pub fn new(convert: ConvertService, settings: Arc<Settings>) -> Self {
        Self { convert, settings }
    }

    pub fn upload_limit_bytes(&self) -> u64 {
        self.settings.uploads.max_file_bytes.get()
    }
}

pub fn build_router(state: HttpState) -> Router {
    let body_limit = usize::try_from(state.upload_limit_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/healthz", get(health::healthz))
        .route(
            "/convert",
            post(convert::convert_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .fallback(error::route_not_found)
        .method_not_allowed_fallback(error::route_not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .layer(CorsLayer::permissive())
}
