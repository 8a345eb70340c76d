//! Caller-supplied extension points
//!
//! Hooks are built by the caller and passed into resolution and stage-list
//! construction by parameter. There is no process-wide hooks instance.

use crate::shared::models::Operation;
use std::fmt;
use std::sync::Arc;

/// Compile-time evaluator for constant sub-expressions
///
/// Given an op rooting a constant expression, returns its evaluated
/// replacement, or `None` to leave the op untouched.
pub trait ConstEvalHook: Send + Sync {
    fn evaluate(&self, op: &Operation) -> Option<Operation>;
}

impl<F> ConstEvalHook for F
where
    F: Fn(&Operation) -> Option<Operation> + Send + Sync,
{
    fn evaluate(&self, op: &Operation) -> Option<Operation> {
        self(op)
    }
}

/// Hooks bundle handed to the orchestrator
#[derive(Clone, Default)]
pub struct PipelineHooks {
    pub const_eval: Option<Arc<dyn ConstEvalHook>>,
}

impl PipelineHooks {
    /// Bundle with no hooks installed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: Install a const-eval hook
    pub fn with_const_eval(mut self, hook: impl ConstEvalHook + 'static) -> Self {
        self.const_eval = Some(Arc::new(hook));
        self
    }

    pub fn has_const_eval(&self) -> bool {
        self.const_eval.is_some()
    }
}

impl fmt::Debug for PipelineHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHooks")
            .field("const_eval", &self.const_eval.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hooks() {
        let hooks = PipelineHooks::empty();
        assert!(!hooks.has_const_eval());
        assert_eq!(format!("{:?}", hooks), "PipelineHooks { const_eval: None }");
    }

    #[test]
    fn test_closure_is_hook() {
        let hooks = PipelineHooks::empty().with_const_eval(|op: &Operation| {
            op.is("arith.addi")
                .then(|| Operation::new("arith.constant").with_attr("value", 3i64))
        });
        assert!(hooks.has_const_eval());

        let hook = hooks.const_eval.as_ref().unwrap();
        let folded = hook.evaluate(&Operation::new("arith.addi")).unwrap();
        assert!(folded.is("arith.constant"));
        assert!(hook.evaluate(&Operation::new("arith.muli")).is_none());
    }

    #[test]
    fn test_hooks_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineHooks>();
    }
}
