//! Errores fatales del pipeline.
//!
//! Todo error que llega a este enum aborta la corrida completa. Los fallos
//! de limpieza no aparecen aquí: se acumulan en `CleanupReport`.

use thiserror::Error;

use crate::engine::PipelineState;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("tool `{tool}` failed: {reason}")]
    ToolExecution { tool: String, reason: String },
    #[error("object store error: {0}")]
    StoreTransient(#[from] StoreError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("missing dependency: {0}")]
    MissingDependency(String),
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition { from: PipelineState, to: PipelineState },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolExecution { tool: tool.into(),
                              reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreOp;

    #[test]
    fn store_error_converts_into_transient_variant() {
        let err: PipelineError = StoreError::transient(StoreOp::Exists, "b", "k", "throttled").into();
        assert!(matches!(err, PipelineError::StoreTransient(_)));
        assert_eq!(err.to_string(), "object store error: exists failed for b/k: throttled");
    }

    #[test]
    fn tool_error_format() {
        let err = PipelineError::tool("align", "exit status 1");
        assert_eq!(err.to_string(), "tool `align` failed: exit status 1");
    }
}
