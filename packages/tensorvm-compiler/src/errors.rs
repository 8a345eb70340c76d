//! Error types for tensorvm-compiler
//!
//! Unifies configuration, pipeline and I/O failures for callers that drive
//! the whole compiler (the `tensorvm-opt` tool, embedders).

use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for tensorvm-compiler operations
#[derive(Debug, Error)]
pub enum CompilerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Program tree (de)serialization error
    #[error("Invalid program tree: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl CompilerError {
    /// Whether the failure happened before any stage ran
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Pipeline(err) => err.is_config(),
            _ => false,
        }
    }

    /// Process exit status: 2 for configuration errors, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_config() {
            2
        } else {
            1
        }
    }
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config: CompilerError = ConfigError::Validation("x".to_string()).into();
        assert_eq!(config.exit_code(), 2);

        let wrapped: CompilerError =
            PipelineError::from(ConfigError::Validation("x".to_string())).into();
        assert_eq!(wrapped.exit_code(), 2);

        let stage: CompilerError = PipelineError::stage("vm-lowering", "nope").into();
        assert_eq!(stage.exit_code(), 1);

        let io: CompilerError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let err: CompilerError = PipelineError::stage("vm-lowering", "nope").into();
        assert_eq!(err.to_string(), "Stage 'vm-lowering' failed: error: nope");
    }
}
