use std::fs;

use gvcf_adapters::RemoteObjectStore;
use gvcf_core::{CleanupCoordinator, ObjectStore};

#[test]
fn exists_is_false_for_missing_objects() {
    let root = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    assert!(!store.exists("results", "1000genomes/BAM/S1/RG1.bam").unwrap());
}

#[test]
fn upload_download_and_delete_through_local_backend() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();

    let src = scratch.path().join("RG1_sorted.bam");
    fs::write(&src, b"bam bytes").unwrap();
    store.upload(&src, "results", "1000genomes/BAM/S1/RG1.bam").unwrap();
    assert!(store.exists("results", "1000genomes/BAM/S1/RG1.bam").unwrap());
    assert!(root.path().join("results/1000genomes/BAM/S1/RG1.bam").is_file());

    let dst = scratch.path().join("copy.bam");
    store.download("results", "1000genomes/BAM/S1/RG1.bam", &dst).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"bam bytes");

    let keys = vec!["1000genomes/BAM/S1/RG1.bam".to_string(), "1000genomes/BAM/S1/never-uploaded.bam".to_string()];
    let failed = store.batch_delete("results", &keys).unwrap();
    assert!(failed.is_empty(), "missing objects count as deleted");
    assert!(!store.exists("results", "1000genomes/BAM/S1/RG1.bam").unwrap());
}

#[test]
fn downloading_a_missing_object_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    let err = store.download("results", "nope.g.vcf.gz", &scratch.path().join("x")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn cleanup_coordinator_works_against_the_real_adapter() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    let file = scratch.path().join("S1_X.g.vcf.gz");
    fs::write(&file, b"gvcf").unwrap();
    store.upload(&file, "results", "gvcf/S1_X.g.vcf.gz").unwrap();

    let report = CleanupCoordinator::remove_remote(&store, "results", &["gvcf/S1_X.g.vcf.gz".to_string()]);
    assert_eq!(report.deleted_remote, vec!["gvcf/S1_X.g.vcf.gz".to_string()]);
    assert!(report.is_clean());
}

#[test]
fn keys_with_reserved_characters_land_verbatim() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    let src = scratch.path().join("S1.g.vcf.gz");
    fs::write(&src, b"gvcf").unwrap();

    let key = "final/{v1}/S1[a].g.vcf.gz";
    store.upload(&src, "results", key).unwrap();
    assert!(root.path().join("results/final/{v1}/S1[a].g.vcf.gz").is_file());
    assert!(store.exists("results", key).unwrap());

    let failed = store.batch_delete("results", &[key.to_string()]).unwrap();
    assert!(failed.is_empty());
    assert!(!root.path().join("results/final/{v1}/S1[a].g.vcf.gz").exists());
}

#[test]
fn batch_delete_removes_every_key_in_one_pass() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    let src = scratch.path().join("part.g.vcf.gz");
    fs::write(&src, b"gvcf").unwrap();

    let mut keys: Vec<String> = ["1", "2", "X"].iter().map(|c| format!("1000genomes/gVCF/S1/S1_{c}.g.vcf.gz")).collect();
    for key in &keys {
        store.upload(&src, "results", key).unwrap();
    }
    keys.insert(1, "1000genomes/gVCF/S1/S1_MT.g.vcf.gz".to_string());

    let failed = store.batch_delete("results", &keys).unwrap();
    assert!(failed.is_empty(), "{failed:?}");
    for key in &keys {
        assert!(!store.exists("results", key).unwrap());
    }
}

#[test]
fn empty_files_upload_as_empty_objects() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    let src = scratch.path().join("empty.g.vcf.gz");
    fs::write(&src, b"").unwrap();

    store.upload(&src, "results", "final/empty.g.vcf.gz").unwrap();
    assert_eq!(fs::read(root.path().join("results/final/empty.g.vcf.gz")).unwrap(), b"");
}

#[test]
fn failed_upload_leaves_no_partial_object() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let store = RemoteObjectStore::local(root.path()).unwrap();
    // Abrir un directorio funciona, leerlo no: falla con la subida ya iniciada.
    let err = store.upload(scratch.path(), "results", "final/S1.g.vcf.gz").unwrap_err();
    assert!(!err.is_not_found());

    assert!(!store.exists("results", "final/S1.g.vcf.gz").unwrap());
    let leftovers: Vec<_> = fs::read_dir(root.path().join("results/final")).map(|d| d.collect::<Vec<_>>())
                                                                           .unwrap_or_default();
    assert!(leftovers.is_empty(), "staged parts must be aborted: {leftovers:?}");
}
