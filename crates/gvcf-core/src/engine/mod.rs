//! Orquestación de la corrida.
//!
//! Provee la máquina de estados, la configuración validada de entrada y el
//! `PipelineOrchestrator` que ejecuta la secuencia completa.

pub mod config;
pub mod orchestrator;
pub mod state;

pub use config::PipelineConfig;
pub use orchestrator::{MergedCall, PipelineOrchestrator, RunSummary};
pub use state::PipelineState;
