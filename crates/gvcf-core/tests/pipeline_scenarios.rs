
use std::fs;
use std::time::Duration;

use gvcf_core::constants::{CALL_INDEX_EXT, DEFAULT_BAM_KEY, DEFAULT_GVCF_KEY};
use gvcf_core::{ArtifactKind, CacheKeys, ObjectStore, Partition, PipelineError, PipelineOrchestrator, PipelineState,
                ReadGroup, RetryPolicy, RunEventKind, Sample, StoreOp, ToolKind};
use test_support::*;

#[test]
fn fresh_run_computes_everything_and_leaves_only_the_deliverable() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());

    let summary = orch.run().expect("run should succeed");

    let tools = orch.tools();
    assert_eq!(tools.count(ToolKind::Align), 1);
    assert_eq!(tools.count(ToolKind::IndexAlignment), 1);
    assert_eq!(tools.count(ToolKind::CallPartition), Partition::COUNT);
    assert_eq!(tools.count(ToolKind::MergeCalls), 1);
    assert_eq!(summary.tool_invocations, 3 + Partition::COUNT);
    assert_eq!(summary.computed_units, 1 + Partition::COUNT);
    assert_eq!(summary.cache_hits, 0);
    assert_eq!(orch.state(), PipelineState::Done);

    // 27 unidades (1 read group + 26 particiones), datos + índice cada una.
    assert_eq!(summary.cleanup.deleted_remote.len(), 2 * (1 + Partition::COUNT));
    assert!(summary.cleanup.is_clean());
    assert_eq!(store.keys(RESULTS_BUCKET), vec!["final/S1.g.vcf.gz".to_string(), format!("final/S1.g.vcf.gz{CALL_INDEX_EXT}")]);
    assert_eq!(summary.deliverable.to_string(), UPLOAD_LOCATION);

    assert!(scratch_files(scratch.path()).is_empty(), "no local intermediates may remain");
    // Los FASTQ de entrada no se tocan.
    assert_eq!(store.keys(READS_BUCKET).len(), 2);
}

#[test]
fn deliverable_concatenates_partitions_in_enumeration_order() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    // Mitad de las particiones ya está en cache: se mezclan descargas y cálculos.
    for p in Partition::all().filter(|p| p.index() % 2 == 1) {
        let key = format!("1000genomes/gVCF/S1/S1_{}.g.vcf.gz", p.label());
        store.put_object(RESULTS_BUCKET, &key, format!("call:{}\n", p.label()));
        store.put_object(RESULTS_BUCKET, &format!("{key}{CALL_INDEX_EXT}"), "tbi");
    }
    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let summary = orch.run().unwrap();

    assert_eq!(summary.cache_hits, Partition::COUNT / 2);
    let body = String::from_utf8(store.get_object(RESULTS_BUCKET, "final/S1.g.vcf.gz").unwrap()).unwrap();
    assert_eq!(body, expected_merge_body());
}

#[test]
fn partition_calling_waits_for_every_alignment() {
    let scratch = tempfile::tempdir().unwrap();
    let rgs = ["SRR1", "SRR2", "SRR3"];
    let store = seeded_store(&rgs);
    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &rgs), &store, FakeInvoker::default());
    orch.run().unwrap();

    let calls = &orch.tools().calls;
    let last_index = calls.iter().rposition(|c| c.tool == ToolKind::IndexAlignment).unwrap();
    let first_call = calls.iter().position(|c| c.tool == ToolKind::CallPartition).unwrap();
    assert!(last_index < first_call);
    for call in calls.iter().filter(|c| c.tool == ToolKind::CallPartition) {
        assert_eq!(call.args.iter().filter(|a| *a == "-I").count(), rgs.len());
        assert!(call.inputs_present, "every BAM must be resident before calling");
    }
}

#[test]
fn second_run_with_populated_cache_invokes_no_unit_tools() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1", "SRR2"]);
    // La limpieza remota falla en la primera corrida: la cache queda poblada.
    store.inject_fault(StoreOp::Delete, "1000genomes/", "access denied");
    let first = PipelineOrchestrator::new(config(scratch.path(), &["SRR1", "SRR2"]), &store, FakeInvoker::default())
        .run()
        .unwrap();
    assert!(!first.cleanup.is_clean());
    store.clear_faults();

    let mut second = PipelineOrchestrator::new(config(scratch.path(), &["SRR1", "SRR2"]), &store, FakeInvoker::default());
    let summary = second.run().unwrap();
    let tools = second.tools();
    assert_eq!(tools.count(ToolKind::Align), 0);
    assert_eq!(tools.count(ToolKind::IndexAlignment), 0);
    assert_eq!(tools.count(ToolKind::CallPartition), 0);
    // El merge no se cachea por unidad: siempre se recalcula.
    assert_eq!(tools.count(ToolKind::MergeCalls), 1);
    assert_eq!(summary.cache_hits, 2 + Partition::COUNT);
    assert_eq!(summary.run_fingerprint, first.run_fingerprint);
    assert!(store.keys(RESULTS_BUCKET).iter().all(|k| k.starts_with("final/")));
}

#[test]
fn cached_alignment_is_downloaded_and_partitions_still_called() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.put_object(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam", "cached bam");
    store.put_object(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam.bai", "cached bai");

    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let summary = orch.run().unwrap();

    assert_eq!(orch.tools().count(ToolKind::Align), 0);
    assert_eq!(orch.tools().count(ToolKind::CallPartition), Partition::COUNT);
    assert_eq!(summary.cache_hits, 1);
    let downloads: Vec<_> = store.calls()
                                 .into_iter()
                                 .filter(|c| c.op == StoreOp::Download && c.bucket == RESULTS_BUCKET)
                                 .map(|c| c.key)
                                 .collect();
    assert_eq!(downloads, vec!["1000genomes/BAM/S1/SRR1.bam", "1000genomes/BAM/S1/SRR1.bam.bai"]);
    // Los FASTQ no se descargan cuando el BAM ya existe.
    assert!(!store.calls().iter().any(|c| c.bucket == READS_BUCKET));
}

#[test]
fn store_failure_during_partition_check_aborts_immediately() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.inject_fault(StoreOp::Exists, "S1_5.g.vcf.gz", "503 service unavailable");

    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let err = orch.run().unwrap_err();

    assert!(matches!(err, PipelineError::StoreTransient(_)));
    assert_eq!(orch.state(), PipelineState::CallingPartitions);
    // Particiones 0..=4 calculadas; nada después de la 5.
    assert_eq!(orch.tools().count(ToolKind::CallPartition), 5);
    assert_eq!(orch.tools().count(ToolKind::MergeCalls), 0);
    let checked_after = store.calls()
                             .iter()
                             .filter(|c| c.op == StoreOp::Exists)
                             .any(|c| c.key.ends_with("S1_6.g.vcf.gz"));
    assert!(!checked_after);
    // Sin limpieza: lo ya subido sigue en la cache.
    assert_eq!(store.count_calls(StoreOp::Delete), 0);
    assert!(store.exists(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam").unwrap());
    let events = orch.events();
    assert!(matches!(&events.last().unwrap().kind,
                     RunEventKind::RunFailed { state: PipelineState::CallingPartitions, .. }));
}

#[test]
fn tool_failure_is_fatal_and_skips_cleanup() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    let mut orch =
        PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::failing_on(ToolKind::CallPartition));
    let err = orch.run().unwrap_err();

    assert!(matches!(err, PipelineError::ToolExecution { .. }));
    assert_eq!(orch.tools().count(ToolKind::CallPartition), 1);
    // El BAM local queda (hueco operativo aceptado) y su copia en cache también.
    assert!(scratch.path().join("SRR1_sorted.bam").exists());
    assert!(store.contains(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam.bai"));
    assert!(!orch.events().iter().any(|e| matches!(e.kind, RunEventKind::StateEntered { state: PipelineState::CleaningUp })));
}

#[test]
fn orchestrator_runs_only_once() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    orch.run().unwrap();
    assert!(matches!(orch.run(), Err(PipelineError::InvalidTransition { from: PipelineState::Done, .. })));
}

#[test]
fn event_trail_visits_states_in_order() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    orch.run().unwrap();

    let states: Vec<PipelineState> = orch.events()
                                         .into_iter()
                                         .filter_map(|e| match e.kind {
                                             RunEventKind::StateEntered { state } => Some(state),
                                             _ => None,
                                         })
                                         .collect();
    assert_eq!(states,
               vec![PipelineState::AligningReadGroups,
                    PipelineState::AllAlignmentsReady,
                    PipelineState::CallingPartitions,
                    PipelineState::AllPartitionCallsReady,
                    PipelineState::Merging,
                    PipelineState::UploadingFinal,
                    PipelineState::CleaningUp,
                    PipelineState::Done]);
    let misses = orch.events().iter().filter(|e| matches!(e.kind, RunEventKind::CacheMiss { .. })).count();
    assert_eq!(misses, 1 + Partition::COUNT);
    assert!(matches!(orch.events().last().unwrap().kind, RunEventKind::RunCompleted { .. }));
    assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());
}

#[test]
fn download_failure_on_cache_hit_aborts() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.put_object(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam", "cached bam");
    store.put_object(RESULTS_BUCKET, "1000genomes/BAM/S1/SRR1.bam.bai", "cached bai");
    store.inject_fault(StoreOp::Download, "SRR1.bam", "connection reset");

    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let err = orch.run().unwrap_err();

    assert!(matches!(err, PipelineError::StoreTransient(_)));
    assert_eq!(orch.state(), PipelineState::AligningReadGroups);
    // Un hit que no se puede bajar no se recalcula.
    assert_eq!(orch.tools().count(ToolKind::Align), 0);
    assert_eq!(orch.tools().count(ToolKind::CallPartition), 0);
    assert!(!store.calls().iter().any(|c| c.bucket == READS_BUCKET));
    assert_eq!(store.count_calls(StoreOp::Delete), 0);
}

#[test]
fn upload_failure_after_compute_aborts() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.inject_fault(StoreOp::Upload, "S1_3.g.vcf.gz", "503 service unavailable");

    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let err = orch.run().unwrap_err();

    assert!(matches!(err, PipelineError::StoreTransient(_)));
    assert_eq!(orch.state(), PipelineState::CallingPartitions);
    assert_eq!(orch.tools().count(ToolKind::CallPartition), 4);
    assert_eq!(orch.tools().count(ToolKind::MergeCalls), 0);
    assert!(store.contains(RESULTS_BUCKET, "1000genomes/gVCF/S1/S1_2.g.vcf.gz"));
    assert!(!store.contains(RESULTS_BUCKET, "1000genomes/gVCF/S1/S1_3.g.vcf.gz"));
    assert_eq!(store.count_calls(StoreOp::Delete), 0);
}

#[test]
fn failed_final_upload_keeps_the_cache() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.inject_fault(StoreOp::Upload, "final/", "access denied");

    let mut orch = PipelineOrchestrator::new(config(scratch.path(), &["SRR1"]), &store, FakeInvoker::default());
    let err = orch.run().unwrap_err();

    assert!(matches!(err, PipelineError::StoreTransient(_)));
    assert_eq!(orch.state(), PipelineState::UploadingFinal);
    assert_eq!(orch.store().count_calls(StoreOp::Delete), 0);
    assert!(!store.contains(RESULTS_BUCKET, "final/S1.g.vcf.gz"));

    // Cada unidad quedó en la cache bajo la key que deriva `CacheKeys`.
    let keys = CacheKeys::new(DEFAULT_BAM_KEY, DEFAULT_GVCF_KEY).unwrap();
    let sample = Sample::new("S1").unwrap();
    let mut expected: Vec<String> = [ArtifactKind::Alignment, ArtifactKind::AlignmentIndex]
        .into_iter()
        .filter_map(|kind| keys.for_read_group(&sample, &ReadGroup::new("SRR1"), kind))
        .collect();
    for p in Partition::all() {
        for kind in [ArtifactKind::PartitionCall, ArtifactKind::PartitionCallIndex] {
            expected.extend(keys.for_partition(&sample, p, kind));
        }
    }
    expected.sort();
    assert_eq!(store.keys(RESULTS_BUCKET), expected);
}

#[test]
fn retry_policy_recovers_from_transient_faults() {
    let scratch = tempfile::tempdir().unwrap();
    let store = seeded_store(&["SRR1"]);
    store.inject_fault_times(StoreOp::Exists, "SRR1.bam", "throttled", 2);
    store.inject_fault_times(StoreOp::Upload, "S1_7.g.vcf.gz", "503 service unavailable", 1);
    store.inject_fault_times(StoreOp::Upload, "final/", "connection reset", 1);
    let retry = RetryPolicy { max_retries: 2,
                              base_delay: Duration::from_millis(1) };
    let cfg = config(scratch.path(), &["SRR1"]).with_retry(retry);

    let mut orch = PipelineOrchestrator::new(cfg, &store, FakeInvoker::default());
    let summary = orch.run().expect("transient faults are retried");

    assert_eq!(orch.state(), PipelineState::Done);
    assert_eq!(summary.computed_units, 1 + Partition::COUNT);
    let uploads_of = |key: &str| {
        store.calls().iter().filter(|c| c.op == StoreOp::Upload && c.key == key).count()
    };
    assert_eq!(uploads_of("1000genomes/gVCF/S1/S1_7.g.vcf.gz"), 2);
    assert_eq!(uploads_of("final/S1.g.vcf.gz"), 2);
    assert!(store.contains(RESULTS_BUCKET, "final/S1.g.vcf.gz"));
    assert!(summary.cleanup.is_clean());
}
