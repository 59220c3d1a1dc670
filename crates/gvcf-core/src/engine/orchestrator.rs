//! `PipelineOrchestrator`: secuencia alineamiento -> llamado por partición ->
//! merge -> subida final -> limpieza.
//!
//! Responsable de evaluar las compuertas entre etapas, de pasar a cada etapa
//! el set completo de artifacts que necesita y de liberar almacenamiento
//! transitorio apenas deja de ser necesario.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::cleanup::{CleanupCoordinator, CleanupReport};
use crate::constants::{ALIGNMENT_INDEX_EXT, CALL_INDEX_EXT, ENGINE_VERSION};
use crate::errors::PipelineError;
use crate::event::{InMemoryRunEventStore, Journal, RunEvent, RunEventKind, RunEventStore};
use crate::hashing::hash_value;
use crate::model::{ArtifactKind, CacheOutcome, FastqPair, ObjectLocation, Partition, PipelineRun, UnitId,
                   UnitRecord};
use crate::retry::RetryPolicy;
use crate::stage::{PlannedArtifact, ResumableStage, WorkUnit};
use crate::store::ObjectStore;
use crate::tool::{with_suffix, Invocation, ToolInvoker};

use super::config::PipelineConfig;
use super::state::PipelineState;

/// Resultado del merge. Su ruta es la que se sube y se limpia después.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCall {
    pub data: PathBuf,
    pub index: PathBuf,
}

/// Resumen de una corrida exitosa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub sample: String,
    pub deliverable: ObjectLocation,
    pub cache_hits: usize,
    pub computed_units: usize,
    pub tool_invocations: usize,
    pub cleanup: CleanupReport,
    pub run_fingerprint: String,
}

pub struct PipelineOrchestrator<S, T, E = InMemoryRunEventStore>
    where S: ObjectStore,
          T: ToolInvoker,
          E: RunEventStore
{
    config: PipelineConfig,
    store: S,
    tools: T,
    journal: Journal<E>,
    state: PipelineState,
}

impl<S, T> PipelineOrchestrator<S, T, InMemoryRunEventStore>
    where S: ObjectStore,
          T: ToolInvoker
{
    /// Orquestador con store de eventos en memoria.
    pub fn new(config: PipelineConfig, store: S, tools: T) -> Self {
        Self::with_event_store(config, store, tools, InMemoryRunEventStore::default())
    }
}

impl<S, T, E> PipelineOrchestrator<S, T, E>
    where S: ObjectStore,
          T: ToolInvoker,
          E: RunEventStore
{
    pub fn with_event_store(config: PipelineConfig, store: S, tools: T, events: E) -> Self {
        Self { config,
               store,
               tools,
               journal: Journal::new(events),
               state: PipelineState::Start }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.journal.run_id()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.journal.events()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn into_parts(self) -> (S, T, E) {
        (self.store, self.tools, self.journal.into_store())
    }

    /// Ejecuta la corrida completa. Sólo puede invocarse una vez por
    /// orquestador.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if self.state != PipelineState::Start {
            return Err(PipelineError::InvalidTransition { from: self.state,
                                                          to: PipelineState::AligningReadGroups });
        }
        self.journal.record(RunEventKind::RunStarted { sample: self.config.sample.name().to_string(),
                                                       read_groups: self.config
                                                                        .inputs
                                                                        .iter()
                                                                        .map(|p| p.read_group.id().to_string())
                                                                        .collect(),
                                                       engine_version: ENGINE_VERSION.to_string() });
        let result = self.execute();
        if let Err(e) = &result {
            self.journal.record(RunEventKind::RunFailed { state: self.state,
                                                          error: e.to_string() });
        }
        result
    }

    fn enter(&mut self, to: PipelineState) -> Result<(), PipelineError> {
        if self.state.next() != Some(to) {
            return Err(PipelineError::InvalidTransition { from: self.state, to });
        }
        self.state = to;
        self.journal.record(RunEventKind::StateEntered { state: to });
        Ok(())
    }

    fn execute(&mut self) -> Result<RunSummary, PipelineError> {
        let mut run = PipelineRun::new(self.config.sample.clone(), self.config.read_groups());
        let mut cleanup = CleanupReport::default();

        self.enter(PipelineState::AligningReadGroups)?;
        for pair in self.config.inputs.clone() {
            let record = self.align_read_group(&pair)?;
            run.record_alignment(record)?;
        }

        self.enter(PipelineState::AllAlignmentsReady)?;
        let bams = run.alignment_set()?;

        self.enter(PipelineState::CallingPartitions)?;
        for partition in Partition::all() {
            let record = self.call_partition(partition, &bams)?;
            run.record_partition_call(record)?;
        }

        self.enter(PipelineState::AllPartitionCallsReady)?;
        let gvcfs = run.partition_calls_in_order()?;
        // Los BAMs ya fueron consumidos por todas las particiones.
        cleanup.absorb(self.remove_local(run.alignment_local_paths()));

        self.enter(PipelineState::Merging)?;
        let merged = self.merge(&gvcfs)?;
        cleanup.absorb(self.remove_local(run.partition_call_local_paths()));

        self.enter(PipelineState::UploadingFinal)?;
        self.upload_deliverable(&merged)?;

        self.enter(PipelineState::CleaningUp)?;
        cleanup.absorb(self.remove_local(vec![merged.data.clone(), merged.index.clone()]));
        let keys = run.intermediate_remote_keys();
        let remote = CleanupCoordinator::remove_remote(&self.store, self.config.cache_bucket(), &keys);
        self.journal.record(RunEventKind::RemoteCleanup { deleted: remote.deleted_remote.len(),
                                                          failed: remote.failed_remote.clone() });
        cleanup.absorb(remote);

        let run_fingerprint = self.fingerprint(&run);
        self.enter(PipelineState::Done)?;
        self.journal.record(RunEventKind::RunCompleted { deliverable: self.config.deliverable.to_string(),
                                                         run_fingerprint: run_fingerprint.clone() });

        Ok(RunSummary { run_id: self.journal.run_id(),
                        sample: self.config.sample.name().to_string(),
                        deliverable: self.config.deliverable.clone(),
                        cache_hits: run.count(CacheOutcome::Hit),
                        computed_units: run.count(CacheOutcome::Computed),
                        tool_invocations: self.journal.tool_invocations(),
                        cleanup,
                        run_fingerprint })
    }

    /// Alineamiento + índice de un read group, vía cache.
    fn align_read_group(&mut self, pair: &FastqPair) -> Result<UnitRecord, PipelineError> {
        let cfg = &self.config;
        let rg = &pair.read_group;
        let bam = cfg.scratch_dir.join(format!("{}_sorted.bam", rg.id()));
        let artifacts = planned_pair(&bam,
                                     ALIGNMENT_INDEX_EXT,
                                     [ArtifactKind::Alignment, ArtifactKind::AlignmentIndex],
                                     |kind| cfg.keys.for_read_group(&cfg.sample, rg, kind))?;
        let work = WorkUnit { unit: UnitId::ReadGroup(rg.clone()),
                              artifacts };

        let store = &self.store;
        let tools = &mut self.tools;
        let retry = cfg.retry;
        ResumableStage::new(store, cfg.cache_bucket(), retry).resolve(work, &mut self.journal, |journal| {
            let fq1 = cfg.scratch_dir.join(pair.first.file_name());
            let fq2 = cfg.scratch_dir.join(pair.second.file_name());
            for (remote, local) in [(&pair.first, &fq1), (&pair.second, &fq2)] {
                fetch(store, retry, journal, remote, local)?;
            }
            invoke(tools, journal, &cfg.tools.align(&cfg.sample, rg, &fq1, &fq2, &bam))?;
            let report = CleanupCoordinator::remove_local(vec![fq1, fq2]);
            record_local_cleanup(journal, &report);
            invoke(tools, journal, &cfg.tools.index_alignment(&bam))
        })
    }

    /// Llamado de variantes de una partición sobre el set completo de BAMs.
    fn call_partition(&mut self, partition: Partition, bams: &[PathBuf]) -> Result<UnitRecord, PipelineError> {
        let cfg = &self.config;
        let gvcf = cfg.scratch_dir.join(format!("{}_{}.g.vcf.gz", cfg.sample.name(), partition.label()));
        let artifacts = planned_pair(&gvcf,
                                     CALL_INDEX_EXT,
                                     [ArtifactKind::PartitionCall, ArtifactKind::PartitionCallIndex],
                                     |kind| cfg.keys.for_partition(&cfg.sample, partition, kind))?;
        let work = WorkUnit { unit: UnitId::Partition(partition),
                              artifacts };

        let tools = &mut self.tools;
        ResumableStage::new(&self.store, cfg.cache_bucket(), cfg.retry).resolve(work, &mut self.journal, |journal| {
            invoke(tools, journal, &cfg.tools.call_partition(partition, bams, &gvcf))
        })
    }

    /// Concatena las particiones (ya en orden de enumeración). Siempre se
    /// recalcula localmente.
    fn merge(&mut self, gvcfs: &[PathBuf]) -> Result<MergedCall, PipelineError> {
        let data = self.config.scratch_dir.join(format!("{}.g.vcf.gz", self.config.sample.name()));
        let invocation = self.config.tools.merge_calls(gvcfs, &data);
        invoke(&mut self.tools, &mut self.journal, &invocation)?;
        let index = with_suffix(&data, CALL_INDEX_EXT);
        Ok(MergedCall { data, index })
    }

    fn upload_deliverable(&mut self, merged: &MergedCall) -> Result<(), PipelineError> {
        let target = &self.config.deliverable;
        let index_target = target.with_suffix(CALL_INDEX_EXT);
        for (local, remote) in [(&merged.data, target), (&merged.index, &index_target)] {
            let store = &self.store;
            self.config.retry.run(|| store.upload(local, &remote.bucket, &remote.key))?;
            self.journal.record(RunEventKind::Uploaded { path: local.display().to_string(),
                                                         destination: remote.to_string() });
        }
        Ok(())
    }

    fn remove_local(&mut self, paths: Vec<PathBuf>) -> CleanupReport {
        let report = CleanupCoordinator::remove_local(paths);
        record_local_cleanup(&mut self.journal, &report);
        report
    }

    /// Fingerprint determinista de la corrida: mismas entradas, mismo valor.
    fn fingerprint(&self, run: &PipelineRun) -> String {
        hash_value(&json!({
                       "engine_version": ENGINE_VERSION,
                       "sample": run.sample().name(),
                       "read_groups": run.read_groups().iter().map(|rg| rg.id()).collect::<Vec<_>>(),
                       "cache_keys": run.intermediate_remote_keys(),
                       "deliverable": self.config.deliverable.to_string(),
                   }))
    }
}

/// Datos + índice de una unidad. Las keys remotas salen de `CacheKeys`.
fn planned_pair(local: &Path,
                index_ext: &str,
                kinds: [ArtifactKind; 2],
                key_for: impl Fn(ArtifactKind) -> Option<String>)
                -> Result<Vec<PlannedArtifact>, PipelineError> {
    let locals = [local.to_path_buf(), with_suffix(local, index_ext)];
    kinds.into_iter()
         .zip(locals)
         .map(|(kind, local_path)| {
             let remote_key =
                 key_for(kind).ok_or_else(|| PipelineError::Config(format!("no cache key for {kind:?}")))?;
             Ok(PlannedArtifact { kind,
                                  local_path,
                                  remote_key })
         })
         .collect()
}

/// Invoca un tool y verifica que dejó sus salidas declaradas.
fn invoke<T, E>(tools: &mut T, journal: &mut Journal<E>, invocation: &Invocation) -> Result<(), PipelineError>
    where T: ToolInvoker,
          E: RunEventStore
{
    journal.record(RunEventKind::ToolInvoked { tool: invocation.tool,
                                               command: invocation.to_string() });
    tools.invoke(invocation)?;
    let missing = invocation.missing_outputs();
    if !missing.is_empty() {
        return Err(PipelineError::tool(invocation.tool.to_string(),
                                       format!("declared outputs missing: {missing:?}")));
    }
    Ok(())
}

fn fetch<S, E>(store: &S,
               retry: RetryPolicy,
               journal: &mut Journal<E>,
               remote: &ObjectLocation,
               local: &Path)
               -> Result<(), PipelineError>
    where S: ObjectStore,
          E: RunEventStore
{
    retry.run(|| store.download(&remote.bucket, &remote.key, local))?;
    journal.record(RunEventKind::Downloaded { source: remote.to_string(),
                                              path: local.display().to_string() });
    Ok(())
}

fn record_local_cleanup<E: RunEventStore>(journal: &mut Journal<E>, report: &CleanupReport) {
    journal.record(RunEventKind::LocalCleanup { removed: report.removed_local.len(),
                                                missing: report.missing_local.len(),
                                                failed: report.failed_local.len() });
}
