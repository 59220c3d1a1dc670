//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en el flujo:
//! - Cada decisión del orquestador (transición de estado, hit/miss de cache,
//!   transferencia, invocación de tool, limpieza) se emite como evento a un
//!   `RunEventStore` append-only.
//! - El mismo evento se escribe en el log; el store permite inspeccionar la
//!   traza completa al final (o volcarla como JSON lines).
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::PipelineState;
use crate::tool::ToolKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de toda corrida.
    RunStarted {
        sample: String,
        read_groups: Vec<String>,
        engine_version: String,
    },
    StateEntered { state: PipelineState },
    CacheHit { unit: String, key: String },
    CacheMiss { unit: String, key: String },
    ToolInvoked { tool: ToolKind, command: String },
    Downloaded { source: String, path: String },
    Uploaded { path: String, destination: String },
    /// Resumen de una pasada de borrado local.
    LocalCleanup {
        removed: usize,
        missing: usize,
        failed: usize,
    },
    RemoteCleanup { deleted: usize, failed: Vec<String> },
    RunCompleted { deliverable: String, run_fingerprint: String },
    /// Evento terminal de una corrida abortada.
    RunFailed { state: PipelineState, error: String },
}

impl RunEventKind {
    /// Eventos que merecen `warn!`/`error!` en vez de `info!`.
    pub fn level(&self) -> log::Level {
        match self {
            RunEventKind::RunFailed { .. } => log::Level::Error,
            RunEventKind::RemoteCleanup { failed, .. } if !failed.is_empty() => log::Level::Warn,
            RunEventKind::LocalCleanup { failed, .. } if *failed > 0 => log::Level::Warn,
            _ => log::Level::Info,
        }
    }
}

impl fmt::Display for RunEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEventKind::RunStarted { sample, read_groups, .. } => {
                write!(f, "Starting analysis of {sample} ({} read groups)", read_groups.len())
            }
            RunEventKind::StateEntered { state } => write!(f, "Entering {state:?}"),
            RunEventKind::CacheHit { unit, key } => write!(f, "Cache hit for {unit} at {key}"),
            RunEventKind::CacheMiss { unit, key } => write!(f, "Cache miss for {unit} at {key}, computing"),
            RunEventKind::ToolInvoked { tool, command } => write!(f, "Running {tool}: {command}"),
            RunEventKind::Downloaded { source, path } => write!(f, "Downloaded {source} to {path}"),
            RunEventKind::Uploaded { path, destination } => write!(f, "Uploaded {path} to {destination}"),
            RunEventKind::LocalCleanup { removed, missing, failed } => {
                write!(f, "Removed {removed} local files ({missing} already gone, {failed} failed)")
            }
            RunEventKind::RemoteCleanup { deleted, failed } if failed.is_empty() => {
                write!(f, "Deleted {deleted} intermediate objects")
            }
            RunEventKind::RemoteCleanup { deleted, failed } => {
                write!(f, "Deleted {deleted} intermediate objects; deletion returned errors for {failed:?}")
            }
            RunEventKind::RunCompleted { deliverable, .. } => write!(f, "Analysis finished: {deliverable}"),
            RunEventKind::RunFailed { state, error } => write!(f, "Run aborted in {state:?}: {error}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
