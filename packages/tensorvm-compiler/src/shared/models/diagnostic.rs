//! Structured diagnostics
//!
//! Every failure surfaced by a stage is a list of diagnostics: severity, a
//! human-readable message and, when known, the offending op.

use super::location::Location;
use super::program::{OpPath, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,

    /// Source location of the offending op, if it carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Kind of the offending op
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_kind: Option<String>,

    /// Structural position of the offending op in the program tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<OpPath>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            op_kind: None,
            path: None,
        }
    }

    /// Attach the identity of the op the diagnostic is about
    pub fn at_op(mut self, op: &Operation, path: &OpPath) -> Self {
        self.location = op.location.clone();
        self.op_kind = Some(op.kind.clone());
        self.path = Some(path.clone());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(loc) = &self.location {
            write!(f, "{}: ", loc)?;
        }
        f.write_str(&self.message)?;
        match (&self.op_kind, &self.path) {
            (Some(kind), Some(path)) => write!(f, " ['{}' at {}]", kind, path),
            (Some(kind), None) => write!(f, " ['{}']", kind),
            _ => Ok(()),
        }
    }
}
