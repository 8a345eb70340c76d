//! Well-known op kinds and attribute names

/// Prefix of transient compiler hint attributes (dropped by the last stage)
pub const COMPILER_HINT_PREFIX: &str = "hint.";

/// Attribute tagging an op as a constant sub-expression for const-eval
pub const CONST_EXPR_ATTR: &str = "const_expr";

/// Anchor op kind for function-scoped sub-pipelines
pub const FUNC_OP_KIND: &str = "func.func";

/// Op kinds removed by the assertion-stripping stage
pub const ASSERTION_OP_KINDS: &[&str] = &["util.assert", "std.assert", "cf.assert"];

/// Default op kind checked by the transform-legality gate
pub const DEFAULT_LEGALITY_OP_KIND: &str = "linalg.generic";

/// Default transform marker that must not survive code generation
pub const DEFAULT_LEGALITY_MARKER: &str = "__internal_linalg_transform__";
