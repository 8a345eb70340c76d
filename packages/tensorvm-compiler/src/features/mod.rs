//! Feature modules
//!
//! Each feature contains:
//! - domain/      - Pure types (no tree traversal, no I/O)
//! - application/ - Use cases operating on a program tree

// Transform legality gate run at the code generation boundary
pub mod legality;
