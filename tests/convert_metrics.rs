mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use docx2html::application::convert::{ConversionFailure, ConvertService, DocumentConverter};
use docx2html::config::Settings;
use docx2html::domain::conversion::{Conversion, Warning};
use docx2html::infra::http::{HttpState, build_router};
use docx2html::infra::telemetry;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tower::ServiceExt;

use common::{DOCX_MEDIA_TYPE, Part, convert_request};

struct TwoWarnings;

#[async_trait]
impl DocumentConverter for TwoWarnings {
    async fn convert(&self, _document: Bytes) -> Result<Conversion, ConversionFailure> {
        Ok(Conversion::new(
            "<p>x</p>",
            vec![Warning::warning("one"), Warning::warning("two")],
        ))
    }
}

#[tokio::test]
async fn convert_outcomes_emit_labelled_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let app = build_router(HttpState::new(
        ConvertService::new(Arc::new(TwoWarnings)),
        Arc::new(Settings::default()),
    ));

    let requests = [
        (
            convert_request(&[Part::File {
                name: "file",
                filename: "ok.docx",
                content_type: Some(DOCX_MEDIA_TYPE),
                data: b"PK",
            }]),
            StatusCode::OK,
        ),
        (
            convert_request(&[Part::File {
                name: "file",
                filename: "photo.png",
                content_type: Some("image/png"),
                data: b"\x89PNG",
            }]),
            StatusCode::BAD_REQUEST,
        ),
        (
            convert_request(&[Part::Text {
                name: "note",
                value: "no file here",
            }]),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (request, expected) in requests {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), expected);
    }

    let mut outcomes: HashMap<String, u64> = HashMap::new();
    let mut warnings_total = 0;
    let mut latency_samples = 0;
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = composite_key.key();
        match (key.name(), value) {
            ("docx2html_convert_requests_total", DebugValue::Counter(count)) => {
                let outcome = key
                    .labels()
                    .find(|label| label.key() == "outcome")
                    .map(|label| label.value().to_string())
                    .expect("outcome label");
                outcomes.insert(outcome, count);
            }
            ("docx2html_conversion_warnings_total", DebugValue::Counter(count)) => {
                warnings_total = count;
            }
            ("docx2html_conversion_ms", DebugValue::Histogram(samples)) => {
                latency_samples = samples.len();
            }
            _ => {}
        }
    }

    assert_eq!(outcomes.get("success"), Some(&1));
    assert_eq!(outcomes.get("invalid_file_type"), Some(&1));
    assert_eq!(outcomes.get("missing_file"), Some(&1));
    assert_eq!(outcomes.get("conversion_failed"), None);
    assert_eq!(warnings_total, 2);
    assert_eq!(latency_samples, 1);
}
