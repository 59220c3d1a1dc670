//! `ResumableStage`: decisión cache-o-cálculo para una unidad de trabajo.
//!
//! - Se consulta `exists` sobre la key del artifact principal (el primero).
//! - Miss: se ejecuta el cómputo y luego se sube cada artifact a su key.
//! - Hit: se descarga cada artifact de la unidad a su ruta local.
//! - Cualquier error del store distinto de "no encontrado" aborta.
//!
//! En ambos casos las keys quedan registradas en el `UnitRecord` para la
//! limpieza final.
use std::path::PathBuf;

use crate::errors::PipelineError;
use crate::event::{Journal, RunEventKind, RunEventStore};
use crate::model::{Artifact, ArtifactKind, CacheOutcome, UnitId, UnitRecord};
use crate::retry::RetryPolicy;
use crate::store::ObjectStore;

/// Artifact esperado de una unidad: ruta local + key remota derivada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
    pub remote_key: String,
}

/// Descriptor de una unidad de trabajo cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub unit: UnitId,
    /// El primero es el artifact de datos; su key decide hit/miss.
    pub artifacts: Vec<PlannedArtifact>,
}

pub struct ResumableStage<'a, S: ObjectStore> {
    store: &'a S,
    bucket: &'a str,
    retry: RetryPolicy,
}

impl<'a, S: ObjectStore> ResumableStage<'a, S> {
    pub fn new(store: &'a S, bucket: &'a str, retry: RetryPolicy) -> Self {
        Self { store,
               bucket,
               retry }
    }

    /// Resuelve la unidad. `compute` recibe el journal para registrar sus
    /// propias transferencias e invocaciones.
    pub fn resolve<E, F>(&self, work: WorkUnit, journal: &mut Journal<E>, compute: F) -> Result<UnitRecord, PipelineError>
        where E: RunEventStore,
              F: FnOnce(&mut Journal<E>) -> Result<(), PipelineError>
    {
        let primary = work.artifacts
                          .first()
                          .ok_or_else(|| PipelineError::Config(format!("{} declares no artifacts", work.unit)))?;
        let (store, bucket) = (self.store, self.bucket);

        let present = self.retry.run(|| store.exists(bucket, &primary.remote_key))?;
        let outcome = if present {
            journal.record(RunEventKind::CacheHit { unit: work.unit.to_string(),
                                                    key: primary.remote_key.clone() });
            for a in &work.artifacts {
                self.retry.run(|| store.download(bucket, &a.remote_key, &a.local_path))?;
                journal.record(RunEventKind::Downloaded { source: format!("{bucket}/{}", a.remote_key),
                                                          path: a.local_path.display().to_string() });
            }
            CacheOutcome::Hit
        } else {
            journal.record(RunEventKind::CacheMiss { unit: work.unit.to_string(),
                                                     key: primary.remote_key.clone() });
            compute(journal)?;
            for a in &work.artifacts {
                self.retry.run(|| store.upload(&a.local_path, bucket, &a.remote_key))?;
                journal.record(RunEventKind::Uploaded { path: a.local_path.display().to_string(),
                                                        destination: format!("{bucket}/{}", a.remote_key) });
            }
            CacheOutcome::Computed
        };

        let artifacts = work.artifacts
                            .into_iter()
                            .map(|a| Artifact::cached(a.kind, a.local_path, a.remote_key))
                            .collect();
        Ok(UnitRecord { unit: work.unit,
                        outcome,
                        artifacts })
    }
}
