/// Transform Legality Gate
///
/// Structural checkpoint between hardware abstraction and VM lowering: no op
/// of the disallowed kind may still carry the transform marker attribute.
///
/// ## Semantics
/// - Pre-order walk, each op visited once
/// - Stops at the first offending op (one diagnostic)
/// - Read-only: a passing tree is left untouched
pub mod application;
pub mod domain;

pub use application::*;
pub use domain::*;
