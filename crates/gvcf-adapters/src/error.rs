//! Errores de construcción de adaptadores. Los errores en tiempo de corrida
//! se expresan con los tipos del core (`StoreError`, `PipelineError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("backend de store inválido: {0}")]
    Backend(String),
    #[error("no se pudo iniciar el runtime de IO: {0}")]
    Runtime(#[from] std::io::Error),
}
