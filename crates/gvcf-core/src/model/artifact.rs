//! Artifacts producidos por el pipeline.
//!
//! Un `Artifact` es un archivo calculado. Vive localmente mientras lo
//! necesiten las etapas que dependen de él y, si es intermedio, en la cache
//! remota hasta que el entregable final queda subido.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Alignment,
    AlignmentIndex,
    PartitionCall,
    PartitionCallIndex,
    MergedCall,
    MergedCallIndex,
}

impl ArtifactKind {
    /// Tipos que se borran de la cache remota al final de la corrida.
    pub fn is_intermediate(self) -> bool {
        !matches!(self, ArtifactKind::MergedCall | ArtifactKind::MergedCallIndex)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
    pub remote_key: Option<String>, // None mientras sólo existe localmente
}

impl Artifact {
    pub fn cached(kind: ArtifactKind, local_path: impl Into<PathBuf>, remote_key: impl Into<String>) -> Self {
        Self { kind,
               local_path: local_path.into(),
               remote_key: Some(remote_key.into()) }
    }
}
