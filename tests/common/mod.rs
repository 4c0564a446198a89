#![allow(dead_code)]

use std::io::{Cursor, Write};

use axum::{
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use zip::{ZipWriter, write::SimpleFileOptions};

pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const BOUNDARY: &str = "docx2html-test-boundary";

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: Option<&'a str>,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn convert_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request should build")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub async fn json_response(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).expect("body should be json");
    (status, value)
}

/// Builds a minimal but well-formed `.docx` package in memory.
pub struct DocxFixture {
    body: String,
    relationships: Vec<String>,
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxFixture {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            relationships: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn styles(self, styles: &str) -> Self {
        let xml = format!(r#"<w:styles xmlns:w="{WORD_NS}">{styles}</w:styles>"#);
        self.relationship("rIdStyles", "styles", "styles.xml", false)
            .part("word/styles.xml", xml.as_bytes())
    }

    pub fn numbering(self, numbering: &str) -> Self {
        let xml = format!(r#"<w:numbering xmlns:w="{WORD_NS}">{numbering}</w:numbering>"#);
        self.relationship("rIdNumbering", "numbering", "numbering.xml", false)
            .part("word/numbering.xml", xml.as_bytes())
    }

    pub fn relationship(mut self, id: &str, kind: &str, target: &str, external: bool) -> Self {
        let mode = if external {
            r#" TargetMode="External""#
        } else {
            ""
        };
        self.relationships.push(format!(
            r#"<Relationship Id="{id}" Type="{REL_NS}/{kind}" Target="{target}"{mode}/>"#
        ));
        self
    }

    pub fn part(mut self, path: &str, data: &[u8]) -> Self {
        self.parts.push((path.to_string(), data.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
        let package_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PACKAGE_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="word/document.xml"/></Relationships>"#
        );
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WORD_NS}" xmlns:r="{REL_NS}"><w:body>{}</w:body></w:document>"#,
            self.body
        );
        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PACKAGE_REL_NS}">{}</Relationships>"#,
            self.relationships.concat()
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, data: &[u8]| {
            writer
                .start_file(name, SimpleFileOptions::default())
                .expect("start zip entry");
            writer.write_all(data).expect("write zip entry");
        };
        add("[Content_Types].xml", content_types.as_bytes());
        add("_rels/.rels", package_rels.as_bytes());
        add("word/document.xml", document.as_bytes());
        add("word/_rels/document.xml.rels", document_rels.as_bytes());
        for (path, data) in &self.parts {
            add(path, data);
        }
        writer
            .finish()
            .expect("finish zip archive")
            .into_inner()
    }
}

/// A paragraph with a single plain run.
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
}
