//! Conversion outcome returned by a document collaborator.

use serde::Serialize;

/// Severity of a conversion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Warning,
}

/// A non-fatal diagnostic produced while converting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Warning,
            message: message.into(),
        }
    }
}

/// Markup plus the warnings emitted while producing it, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversion {
    pub markup: String,
    pub warnings: Vec<Warning>,
}

impl Conversion {
    pub fn new(markup: impl Into<String>, warnings: Vec<Warning>) -> Self {
        Self {
            markup: markup.into(),
            warnings,
        }
    }
}
