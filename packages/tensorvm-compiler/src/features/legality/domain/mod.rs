//! Legality domain types

use crate::shared::constants::{DEFAULT_LEGALITY_MARKER, DEFAULT_LEGALITY_OP_KIND};
use crate::shared::models::{Diagnostic, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which ops are illegal at the gate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegalityRule {
    /// Op kind the rule applies to
    pub op_kind: String,

    /// Attribute key that must be absent on such ops
    pub marker: String,
}

impl Default for LegalityRule {
    fn default() -> Self {
        Self::new(DEFAULT_LEGALITY_OP_KIND, DEFAULT_LEGALITY_MARKER)
    }
}

impl LegalityRule {
    pub fn new(op_kind: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            op_kind: op_kind.into(),
            marker: marker.into(),
        }
    }

    pub fn is_violated_by(&self, op: &Operation) -> bool {
        op.kind == self.op_kind && op.has_attr(&self.marker)
    }

    pub fn message(&self) -> String {
        format!("expected no transform markers on '{}'", self.op_kind)
    }
}

/// An op still carried a transform marker at the gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{diagnostic}")]
pub struct LegalityViolation {
    pub diagnostic: Diagnostic,
}

impl LegalityViolation {
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self { diagnostic }
    }
}
