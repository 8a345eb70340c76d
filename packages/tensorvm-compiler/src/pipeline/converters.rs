//! Input dialect capability registry
//!
//! Records which input converters this build can run. Resolution refuses an
//! input dialect whose converter is not registered.

use crate::config::InputDialect;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterRegistry {
    registered: BTreeSet<InputDialect>,
}

impl ConverterRegistry {
    /// Registry with no converters (only `InputDialect::None` is accepted)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every converter shipped in this crate
    pub fn builtin() -> Self {
        Self::empty()
            .with(InputDialect::Mhlo)
            .with(InputDialect::Xla)
            .with(InputDialect::TmTensor)
            .with(InputDialect::Tosa)
    }

    /// Builder: Register a converter
    pub fn with(mut self, dialect: InputDialect) -> Self {
        self.register(dialect);
        self
    }

    pub fn register(&mut self, dialect: InputDialect) {
        if dialect != InputDialect::None {
            self.registered.insert(dialect);
        }
    }

    pub fn is_available(&self, dialect: InputDialect) -> bool {
        dialect == InputDialect::None || self.registered.contains(&dialect)
    }

    /// Registered dialect names, in declaration order
    pub fn available(&self) -> Vec<String> {
        self.registered.iter().map(|d| d.as_str().to_string()).collect()
    }
}
