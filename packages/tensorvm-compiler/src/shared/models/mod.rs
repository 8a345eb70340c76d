//! Shared models

mod diagnostic;
mod location;
pub mod program;

pub use diagnostic::{Diagnostic, Severity};
pub use location::Location;
pub use program::{AttributeValue, Block, OpPath, Operation, ProgramTree, Region, WalkControl};
