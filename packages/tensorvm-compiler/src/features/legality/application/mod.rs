//! Legality gate use case

use super::domain::{LegalityRule, LegalityViolation};
use crate::shared::models::{Diagnostic, ProgramTree, WalkControl};

/// Check that no op of `op_kind` carries `marker`
pub fn verify(tree: &ProgramTree, op_kind: &str, marker: &str) -> Result<(), LegalityViolation> {
    verify_rule(tree, &LegalityRule::new(op_kind, marker))
}

/// Rule-based form of [`verify`]
pub fn verify_rule(tree: &ProgramTree, rule: &LegalityRule) -> Result<(), LegalityViolation> {
    let control = tree.walk(|op, path| {
        if rule.is_violated_by(op) {
            WalkControl::Stop(Diagnostic::error(rule.message()).at_op(op, path))
        } else {
            WalkControl::Continue
        }
    });

    match control {
        WalkControl::Continue => Ok(()),
        WalkControl::Stop(diagnostic) => {
            tracing::debug!(%diagnostic, "transform legality violated");
            Err(LegalityViolation::new(diagnostic))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{DEFAULT_LEGALITY_MARKER, DEFAULT_LEGALITY_OP_KIND};
    use crate::shared::models::{Location, OpPath, Operation, Region};

    fn func(body: Vec<Operation>) -> Operation {
        Operation::new("func.func").with_region(Region::single_block(body))
    }

    fn marked_generic(line: u32) -> Operation {
        Operation::new(DEFAULT_LEGALITY_OP_KIND)
            .with_attr(DEFAULT_LEGALITY_MARKER, "tiled")
            .at(Location::new("model.mlir", line, 5))
    }

    #[test]
    fn test_clean_tree_passes() {
        let tree = ProgramTree::from_operations(vec![func(vec![
            Operation::new(DEFAULT_LEGALITY_OP_KIND),
            Operation::new("linalg.matmul").with_attr(DEFAULT_LEGALITY_MARKER, ()),
        ])]);
        assert!(verify(&tree, DEFAULT_LEGALITY_OP_KIND, DEFAULT_LEGALITY_MARKER).is_ok());
    }

    #[test]
    fn test_empty_tree_passes() {
        assert!(verify(&ProgramTree::new(), "linalg.generic", "m").is_ok());
    }

    #[test]
    fn test_nested_violation_reported_with_path() {
        let tree = ProgramTree::from_operations(vec![func(vec![
            Operation::new("arith.constant"),
            marked_generic(12),
        ])]);

        let violation = verify(&tree, DEFAULT_LEGALITY_OP_KIND, DEFAULT_LEGALITY_MARKER).unwrap_err();
        let diag = &violation.diagnostic;
        assert!(diag.is_error());
        assert_eq!(diag.op_kind.as_deref(), Some(DEFAULT_LEGALITY_OP_KIND));
        assert_eq!(diag.path, Some(OpPath::from_indices(vec![0, 0, 0, 1])));
        assert_eq!(diag.location.as_ref().map(|l| l.line), Some(12));
        assert!(diag.message.contains("expected no transform markers"));
    }

    #[test]
    fn test_first_violation_in_preorder_wins() {
        // Outer generic (line 3) precedes, in pre-order, the one nested in it
        let outer = marked_generic(3).with_region(Region::single_block(vec![marked_generic(4)]));
        let tree = ProgramTree::from_operations(vec![func(vec![outer]), func(vec![marked_generic(9)])]);

        let violation = verify(&tree, DEFAULT_LEGALITY_OP_KIND, DEFAULT_LEGALITY_MARKER).unwrap_err();
        assert_eq!(violation.diagnostic.location.unwrap().line, 3);
    }

    #[test]
    fn test_custom_rule() {
        let tree = ProgramTree::from_operations(vec![Operation::new("test.op").with_attr("test.marker", 1i64)]);
        assert!(verify(&tree, DEFAULT_LEGALITY_OP_KIND, DEFAULT_LEGALITY_MARKER).is_ok());
        assert!(verify_rule(&tree, &LegalityRule::new("test.op", "test.marker")).is_err());
    }
}
