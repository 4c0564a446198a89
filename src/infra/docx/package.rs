//! Access to the OPC package (the ZIP container) behind a `.docx` upload.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::{Reader, events::Event};
use zip::{ZipArchive, result::ZipError};

use super::DocxError;
use super::xml::attr;

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_DOCUMENT: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Relationship {
    pub(super) kind: String,
    pub(super) target: String,
    pub(super) external: bool,
}

/// Relationships of one part, keyed by relationship id.
#[derive(Debug, Clone, Default)]
pub(super) struct Relationships {
    entries: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    pub(super) fn parse(xml: &[u8]) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut relationships = Self::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(element) | Event::Empty(element)
                    if element.local_name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(target)) =
                        (attr(&element, b"Id"), attr(&element, b"Target"))
                    {
                        let relationship = Relationship {
                            kind: attr(&element, b"Type").unwrap_or_default(),
                            target,
                            external: attr(&element, b"TargetMode")
                                .is_some_and(|mode| mode.eq_ignore_ascii_case("External")),
                        };
                        if relationships.entries.insert(id.clone(), relationship).is_none() {
                            relationships.order.push(id);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(relationships)
    }

    pub(super) fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.get(id)
    }

    /// First relationship, in document order, whose type URI ends with `suffix`.
    pub(super) fn find_by_type(&self, suffix: &str) -> Option<&Relationship> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|relationship| relationship.kind.ends_with(suffix))
    }
}

/// In-memory view over the ZIP archive.
///
/// Every part read is charged against a decompressed byte budget shared by
/// the whole package, so a small archive cannot inflate without bound.
pub(super) struct Package {
    archive: ZipArchive<Cursor<Bytes>>,
    budget_bytes: u64,
    remaining_bytes: u64,
}

impl Package {
    pub(super) fn open(data: Bytes, budget_bytes: u64) -> Result<Self, DocxError> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive,
            budget_bytes,
            remaining_bytes: budget_bytes,
        })
    }

    /// Read a part by its package path. Missing parts yield `Ok(None)`.
    pub(super) fn read_part(&mut self, path: &str) -> Result<Option<Vec<u8>>, DocxError> {
        let name = path.trim_start_matches('/');
        let limit_bytes = self.budget_bytes;
        let too_large = || DocxError::PartTooLarge {
            part: name.to_string(),
            limit_bytes,
        };
        match self.archive.by_name(name) {
            Ok(mut file) => {
                // Declared sizes can lie; the bounded read below is what enforces the budget.
                if file.size() > self.remaining_bytes {
                    return Err(too_large());
                }
                let mut data = Vec::new();
                (&mut file)
                    .take(self.remaining_bytes.saturating_add(1))
                    .read_to_end(&mut data)
                    .map_err(|source| DocxError::Part {
                        part: name.to_string(),
                        source,
                    })?;
                let read = data.len() as u64;
                if read > self.remaining_bytes {
                    return Err(too_large());
                }
                self.remaining_bytes -= read;
                Ok(Some(data))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(DocxError::Archive(err)),
        }
    }

    /// Locate the main document part through the package relationships.
    pub(super) fn main_document_path(&mut self) -> Result<String, DocxError> {
        let Some(xml) = self.read_part(PACKAGE_RELS)? else {
            return Ok(DEFAULT_MAIN_DOCUMENT.to_string());
        };
        let relationships = Relationships::parse(&xml).map_err(|source| DocxError::Xml {
            part: PACKAGE_RELS.to_string(),
            source,
        })?;

        Ok(relationships
            .find_by_type(OFFICE_DOCUMENT_REL)
            .map(|relationship| resolve_target("", &relationship.target))
            .unwrap_or_else(|| DEFAULT_MAIN_DOCUMENT.to_string()))
    }

    /// Relationships declared by `part`; empty when the part has none.
    pub(super) fn relationships_for(&mut self, part: &str) -> Result<Relationships, DocxError> {
        let rels_path = relationships_path(part);
        match self.read_part(&rels_path)? {
            Some(xml) => Relationships::parse(&xml).map_err(|source| DocxError::Xml {
                part: rels_path,
                source,
            }),
            None => Ok(Relationships::default()),
        }
    }

    /// Read the part `part` points at with a relationship of type `kind`,
    /// falling back to `default_path` when no such relationship exists.
    pub(super) fn related_part(
        &mut self,
        part: &str,
        relationships: &Relationships,
        kind: &str,
        default_path: &str,
    ) -> Result<Option<(String, Vec<u8>)>, DocxError> {
        let path = relationships
            .find_by_type(kind)
            .filter(|relationship| !relationship.external)
            .map(|relationship| resolve_target(part, &relationship.target))
            .unwrap_or_else(|| default_path.to_string());

        Ok(self.read_part(&path)?.map(|data| (path, data)))
    }
}

/// Resolve a relationship target relative to the part that declares it.
pub(super) fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
        Some((directory, _)) => directory.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((directory, file)) => format!("{directory}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}
