//! Invocación de herramientas externas.
//!
//! - `Invocation`: descripción estructurada (argumentos + redirecciones).
//! - `ToolSettings`: parámetros lógicos de cada etapa.
//! - `ToolInvoker`: capacidad que ejecuta una invocación hasta completarla.

pub mod commands;
pub mod invocation;

pub use commands::{with_suffix, ToolSettings};
pub use invocation::{CommandLine, Invocation, StdoutPlan, ToolKind};

use crate::errors::PipelineError;

/// Ejecuta una invocación de forma síncrona. Éxito implica exit status cero
/// en todas las etapas; cualquier otro resultado es `ToolExecution`.
pub trait ToolInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), PipelineError>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for &mut T {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), PipelineError> {
        (**self).invoke(invocation)
    }
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for Box<T> {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), PipelineError> {
        (**self).invoke(invocation)
    }
}
