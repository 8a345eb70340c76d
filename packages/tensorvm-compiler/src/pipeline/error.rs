//! Typed pipeline errors
//!
//! Every error here ends the run. Configuration errors are raised before any
//! stage executes; stage and legality errors carry the diagnostics of the
//! stage that stopped the pipeline.

use crate::config::ConfigError;
use crate::features::legality::LegalityViolation;
use crate::shared::models::{Diagnostic, OpPath};
use thiserror::Error;

/// A stage reported failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed: {}", summarize(diagnostics))]
pub struct StageFailure {
    pub stage: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no diagnostics".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (+{} more)", first, rest.len()),
    }
}

impl StageFailure {
    pub fn new(stage: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            stage: stage.into(),
            diagnostics,
        }
    }

    /// Failure with a single error diagnostic
    pub fn message(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(stage, vec![Diagnostic::error(message)])
    }
}

/// Pipeline execution errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Options could not be resolved
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An opaque stage failed
    #[error(transparent)]
    Stage(#[from] StageFailure),

    /// The legality gate found a residual transform marker
    #[error("Stage '{stage}' failed: {violation}")]
    Legality {
        stage: String,
        #[source]
        violation: LegalityViolation,
    },
}

impl PipelineError {
    /// Create a stage failure with one error message
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage(StageFailure::message(stage, message))
    }

    /// Create a legality error
    pub fn legality(stage: impl Into<String>, violation: LegalityViolation) -> Self {
        Self::Legality {
            stage: stage.into(),
            violation,
        }
    }

    /// Ordered diagnostics describing the failure
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Config(err) => vec![Diagnostic::error(err.to_string())],
            Self::Stage(failure) => failure.diagnostics.clone(),
            Self::Legality { violation, .. } => vec![violation.diagnostic.clone()],
        }
    }

    /// Re-anchor diagnostic paths produced inside a scoped sub-tree
    pub fn rebased(mut self, anchor: &OpPath) -> Self {
        let rebase = |diagnostic: &mut Diagnostic| {
            if let Some(path) = diagnostic.path.take() {
                diagnostic.path = Some(path.rebased(anchor));
            }
        };
        match &mut self {
            Self::Config(_) => {}
            Self::Stage(failure) => failure.diagnostics.iter_mut().for_each(rebase),
            Self::Legality { violation, .. } => rebase(&mut violation.diagnostic),
        }
        self
    }

    /// Name of the failing stage (`None` for configuration errors)
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::Config(_) => None,
            Self::Stage(failure) => Some(&failure.stage),
            Self::Legality { stage, .. } => Some(stage),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Stage(_) => "stage",
            Self::Legality { .. } => "legality",
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
