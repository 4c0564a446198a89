//! `.docx` to HTML conversion, the collaborator behind `/convert`.
//!
//! The archive is opened in memory, `document.xml` is read into a small block
//! tree and rendered as semantic HTML. Style, numbering and relationship parts
//! are optional; only the main document part is required.

mod html;
mod model;
mod numbering;
mod package;
mod reader;
mod styles;
mod xml;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use zip::result::ZipError;

use crate::application::convert::{ConversionFailure, DocumentConverter};
use crate::domain::conversion::Conversion;
use crate::domain::uploads::DEFAULT_MAX_UPLOAD_BYTES;

use self::html::HtmlWriter;
use self::numbering::Numbering;
use self::package::Package;
use self::styles::Styles;

const STYLES_REL: &str = "/styles";
const NUMBERING_REL: &str = "/numbering";
const DEFAULT_STYLES: &str = "word/styles.xml";
const DEFAULT_NUMBERING: &str = "word/numbering.xml";

/// Decompressed bytes a package may yield per byte of upload limit.
pub const DECOMPRESSION_RATIO_LIMIT: u64 = 8;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("{0}")]
    Archive(#[from] ZipError),
    #[error("Could not find main document part. Are you sure this is a valid .docx file?")]
    MissingMainDocument,
    #[error("part `{part}` exceeds the decompressed size limit of {limit_bytes} bytes")]
    PartTooLarge { part: String, limit_bytes: u64 },
    #[error("failed to read `{part}`: {source}")]
    Part {
        part: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse `{part}`: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },
    #[error("conversion task failed: {0}")]
    Task(String),
}

impl From<DocxError> for ConversionFailure {
    fn from(error: DocxError) -> Self {
        ConversionFailure::new(error.to_string())
    }
}

/// Convert a `.docx` buffer into HTML plus warnings. CPU bound; call off the reactor.
///
/// `budget_bytes` caps the total decompressed size of every part read.
pub fn convert_document(document: Bytes, budget_bytes: u64) -> Result<Conversion, DocxError> {
    let mut package = Package::open(document, budget_bytes)?;
    let part = package.main_document_path()?;
    let xml = package
        .read_part(&part)?
        .ok_or(DocxError::MissingMainDocument)?;

    let relationships = package.relationships_for(&part)?;
    let styles = match package.related_part(&part, &relationships, STYLES_REL, DEFAULT_STYLES)? {
        Some((path, data)) => {
            Styles::parse(&data).map_err(|source| DocxError::Xml { part: path, source })?
        }
        None => Styles::default(),
    };
    let numbering =
        match package.related_part(&part, &relationships, NUMBERING_REL, DEFAULT_NUMBERING)? {
            Some((path, data)) => {
                Numbering::parse(&data).map_err(|source| DocxError::Xml { part: path, source })?
            }
            None => Numbering::default(),
        };

    let blocks = reader::read_document(&xml).map_err(|source| DocxError::Xml {
        part: part.clone(),
        source,
    })?;

    HtmlWriter::new(&mut package, &part, &relationships, &styles, &numbering).render(&blocks)
}

/// [`DocumentConverter`] backed by [`convert_document`] on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct DocxConverter {
    budget_bytes: u64,
}

impl DocxConverter {
    /// Converter sized for uploads of at most `max_upload_bytes`.
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            budget_bytes: max_upload_bytes.saturating_mul(DECOMPRESSION_RATIO_LIMIT),
        }
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }
}

impl Default for DocxConverter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

#[async_trait]
impl DocumentConverter for DocxConverter {
    async fn convert(&self, document: Bytes) -> Result<Conversion, ConversionFailure> {
        let budget_bytes = self.budget_bytes;
        let outcome =
            tokio::task::spawn_blocking(move || convert_document(document, budget_bytes))
                .await
                .map_err(|err| DocxError::Task(err.to_string()))?;
        Ok(outcome?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    const BUDGET: u64 = 1024 * 1024;

    fn archive(parts: &[(&str, &str)]) -> Bytes {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start part");
            writer.write_all(content.as_bytes()).expect("write part");
        }
        Bytes::from(writer.finish().expect("finish archive").into_inner())
    }

    #[test]
    fn not_a_zip_reports_archive_error() {
        let err = convert_document(Bytes::from_static(b"definitely not a zip"), BUDGET)
            .expect_err("garbage must fail");
        assert!(matches!(err, DocxError::Archive(_)));
    }

    #[test]
    fn archive_without_document_reports_missing_main_part() {
        let err = convert_document(archive(&[("hello.txt", "hi")]), BUDGET)
            .expect_err("no document part");
        assert_eq!(
            err.to_string(),
            "Could not find main document part. Are you sure this is a valid .docx file?"
        );
    }

    #[test]
    fn converts_minimal_document_without_optional_parts() {
        let document = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p/></w:body></w:document>"#;
        let conversion =
            convert_document(archive(&[("word/document.xml", document)]), BUDGET)
                .expect("converts");

        assert_eq!(conversion.markup, "<p>Hello</p>");
        assert!(conversion.warnings.is_empty());
    }

    #[tokio::test]
    async fn converter_maps_errors_to_failures() {
        let failure = DocxConverter::default()
            .convert(archive(&[("hello.txt", "hi")]))
            .await
            .expect_err("no document part");
        assert_eq!(
            failure.message(),
            "Could not find main document part. Are you sure this is a valid .docx file?"
        );
    }

    #[test]
    fn converter_budget_scales_with_upload_limit() {
        assert_eq!(DocxConverter::new(1024).budget_bytes(), 8 * 1024);
        assert_eq!(DocxConverter::new(u64::MAX).budget_bytes(), u64::MAX);
    }
}
