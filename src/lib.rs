//! DOCX to HTML conversion service.
//!
//! The crate is layered the usual way: `domain` holds request-scoped values and
//! invariants, `application` drives the validate-then-convert pipeline, `infra`
//! adapts it to HTTP and provides the DOCX collaborator, and `config` resolves
//! deployment settings.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
