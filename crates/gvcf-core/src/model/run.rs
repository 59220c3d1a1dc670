//! Agregación en memoria de una corrida (`PipelineRun`).
//!
//! Cada unidad de trabajo (read group o partición) deja un `UnitRecord`
//! explícito. Las compuertas entre etapas se evalúan una sola vez sobre la
//! secuencia completa de registros, nunca sobre listas acumuladas a mano.
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

use super::artifact::{Artifact, ArtifactKind};
use super::partition::Partition;
use super::read_group::ReadGroup;
use super::sample::Sample;

/// Identidad de una unidad de trabajo cacheable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitId {
    ReadGroup(ReadGroup),
    Partition(Partition),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::ReadGroup(rg) => write!(f, "read group {rg}"),
            UnitId::Partition(p) => write!(f, "partition {p}"),
        }
    }
}

/// Cómo se obtuvo una unidad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheOutcome {
    /// Descargada desde la cache remota.
    Hit,
    /// Calculada localmente y subida a la cache.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit: UnitId,
    pub outcome: CacheOutcome,
    pub artifacts: Vec<Artifact>,
}

impl UnitRecord {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Estado transitorio de una invocación del pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    sample: Sample,
    read_groups: Vec<ReadGroup>,
    alignments: Vec<UnitRecord>,
    partition_calls: Vec<UnitRecord>,
}

impl PipelineRun {
    pub fn new(sample: Sample, read_groups: Vec<ReadGroup>) -> Self {
        Self { sample,
               read_groups,
               alignments: Vec::new(),
               partition_calls: Vec::new() }
    }

    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    pub fn read_groups(&self) -> &[ReadGroup] {
        &self.read_groups
    }

    pub fn record_alignment(&mut self, record: UnitRecord) -> Result<(), PipelineError> {
        let UnitId::ReadGroup(rg) = &record.unit else {
            return Err(PipelineError::MissingDependency(format!("{} is not an alignment unit", record.unit)));
        };
        if !self.read_groups.contains(rg) {
            return Err(PipelineError::MissingDependency(format!("unexpected {}", record.unit)));
        }
        if self.alignments.iter().any(|r| r.unit == record.unit) {
            return Err(PipelineError::MissingDependency(format!("{} recorded twice", record.unit)));
        }
        self.alignments.push(record);
        Ok(())
    }

    pub fn record_partition_call(&mut self, record: UnitRecord) -> Result<(), PipelineError> {
        if !matches!(record.unit, UnitId::Partition(_)) {
            return Err(PipelineError::MissingDependency(format!("{} is not a partition unit", record.unit)));
        }
        if self.partition_calls.iter().any(|r| r.unit == record.unit) {
            return Err(PipelineError::MissingDependency(format!("{} recorded twice", record.unit)));
        }
        self.partition_calls.push(record);
        Ok(())
    }

    /// Compuerta `AllAlignmentsReady`: un BAM residente por cada read group,
    /// en el orden de entrada.
    pub fn alignment_set(&self) -> Result<Vec<PathBuf>, PipelineError> {
        self.read_groups
            .iter()
            .map(|rg| {
                let unit = UnitId::ReadGroup(rg.clone());
                let path = self.alignments
                               .iter()
                               .find(|r| r.unit == unit)
                               .and_then(|r| r.artifact(ArtifactKind::Alignment))
                               .map(|a| a.local_path.clone())
                               .ok_or_else(|| PipelineError::MissingDependency(format!("no alignment for {unit}")))?;
                ensure_resident(&unit, path)
            })
            .collect()
    }

    /// Compuerta `AllPartitionCallsReady`: una llamada por partición, en el
    /// orden de enumeración sin importar el orden en que se registraron.
    pub fn partition_calls_in_order(&self) -> Result<Vec<PathBuf>, PipelineError> {
        Partition::all().map(|p| {
                            let unit = UnitId::Partition(p);
                            let path =
                                self.partition_calls
                                    .iter()
                                    .find(|r| r.unit == unit)
                                    .and_then(|r| r.artifact(ArtifactKind::PartitionCall))
                                    .map(|a| a.local_path.clone())
                                    .ok_or_else(|| PipelineError::MissingDependency(format!("no call for {unit}")))?;
                            ensure_resident(&unit, path)
                        })
                        .collect()
    }

    /// Rutas locales (datos + índice) de los alineamientos.
    pub fn alignment_local_paths(&self) -> Vec<PathBuf> {
        local_paths(&self.alignments)
    }

    pub fn partition_call_local_paths(&self) -> Vec<PathBuf> {
        local_paths(&self.partition_calls)
    }

    /// Keys remotas de todos los intermedios, calculados o descargados.
    pub fn intermediate_remote_keys(&self) -> Vec<String> {
        self.alignments
            .iter()
            .chain(self.partition_calls.iter())
            .flat_map(|r| r.artifacts.iter())
            .filter(|a| a.kind.is_intermediate())
            .filter_map(|a| a.remote_key.clone())
            .collect()
    }

    pub fn count(&self, outcome: CacheOutcome) -> usize {
        self.alignments
            .iter()
            .chain(self.partition_calls.iter())
            .filter(|r| r.outcome == outcome)
            .count()
    }
}

fn local_paths(records: &[UnitRecord]) -> Vec<PathBuf> {
    records.iter().flat_map(|r| r.artifacts.iter().map(|a| a.local_path.clone())).collect()
}

fn ensure_resident(unit: &UnitId, path: PathBuf) -> Result<PathBuf, PipelineError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(PipelineError::MissingDependency(format!("{unit} is not resident at {}", path.display())))
    }
}
