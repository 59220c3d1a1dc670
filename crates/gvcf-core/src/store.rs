//! Capacidad de almacenamiento de objetos remotos.
//!
//! El core sólo conoce este trait: existe / descarga / sube / borrado en
//! lote. "No encontrado" se distingue siempre de cualquier otro fallo de
//! transporte; `exists` lo expresa como `Ok(false)`.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOp {
    Exists,
    Download,
    Upload,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        StoreOp::Exists => "exists",
                        StoreOp::Download => "download",
                        StoreOp::Upload => "upload",
                        StoreOp::Delete => "delete",
                    })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("{op} failed for {bucket}/{key}: {message}")]
    Transient {
        op: StoreOp,
        bucket: String,
        key: String,
        message: String,
    },
}

impl StoreError {
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound { bucket: bucket.into(),
                         key: key.into() }
    }

    pub fn transient(op: StoreOp,
                     bucket: impl Into<String>,
                     key: impl Into<String>,
                     message: impl Into<String>)
                     -> Self {
        Self::Transient { op,
                          bucket: bucket.into(),
                          key: key.into(),
                          message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Almacenamiento remoto de objetos por bucket + key. Todas las llamadas son
/// bloqueantes.
pub trait ObjectStore {
    /// `Ok(false)` si el objeto no existe; `Err` para cualquier otro fallo.
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError>;
    fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError>;
    fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError>;
    /// Borrado best-effort. Devuelve las keys que no pudieron borrarse.
    fn batch_delete(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StoreError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        (**self).exists(bucket, key)
    }
    fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError> {
        (**self).download(bucket, key, local_path)
    }
    fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        (**self).upload(local_path, bucket, key)
    }
    fn batch_delete(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StoreError> {
        (**self).batch_delete(bucket, keys)
    }
}

/// Llamada registrada por `InMemoryObjectStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone)]
struct Fault {
    op: StoreOp,
    key_fragment: String,
    message: String,
    /// Fallos restantes; `None` falla siempre.
    remaining: Option<usize>,
}

/// Store en memoria para pruebas y ejecuciones sin red. Los objetos son
/// bytes; download/upload copian desde/hacia el filesystem local.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<Vec<StoreCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_object(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(&(bucket.to_string(), key.to_string())).cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        lock(&self.objects).contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Keys presentes en un bucket, ordenadas.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.objects).keys().filter(|(b, _)| b == bucket).map(|(_, k)| k.clone()).collect()
    }

    /// Hace fallar con error transitorio toda operación `op` cuya key
    /// contenga `key_fragment`.
    pub fn inject_fault(&self, op: StoreOp, key_fragment: &str, message: &str) {
        lock(&self.faults).push(Fault { op,
                                        key_fragment: key_fragment.to_string(),
                                        message: message.to_string(),
                                        remaining: None });
    }

    /// Como `inject_fault`, pero sólo las primeras `times` llamadas fallan.
    pub fn inject_fault_times(&self, op: StoreOp, key_fragment: &str, message: &str, times: usize) {
        lock(&self.faults).push(Fault { op,
                                        key_fragment: key_fragment.to_string(),
                                        message: message.to_string(),
                                        remaining: Some(times) });
    }

    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, op: StoreOp) -> usize {
        lock(&self.calls).iter().filter(|c| c.op == op).count()
    }

    fn enter(&self, op: StoreOp, bucket: &str, key: &str) -> Result<(), StoreError> {
        lock(&self.calls).push(StoreCall { op,
                                           bucket: bucket.to_string(),
                                           key: key.to_string() });
        let mut faults = lock(&self.faults);
        let hit = faults.iter_mut()
                        .find(|f| f.op == op && f.remaining != Some(0) && key.contains(&f.key_fragment));
        match hit {
            Some(f) => {
                if let Some(n) = f.remaining.as_mut() {
                    *n -= 1;
                }
                Err(StoreError::transient(op, bucket, key, f.message.clone()))
            }
            None => Ok(()),
        }
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        self.enter(StoreOp::Exists, bucket, key)?;
        Ok(self.contains(bucket, key))
    }

    fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError> {
        self.enter(StoreOp::Download, bucket, key)?;
        let data = self.get_object(bucket, key).ok_or_else(|| StoreError::not_found(bucket, key))?;
        fs::write(local_path, data).map_err(|e| StoreError::transient(StoreOp::Download, bucket, key, e.to_string()))
    }

    fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.enter(StoreOp::Upload, bucket, key)?;
        let data = fs::read(local_path).map_err(|e| StoreError::transient(StoreOp::Upload, bucket, key, e.to_string()))?;
        self.put_object(bucket, key, data);
        Ok(())
    }

    fn batch_delete(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StoreError> {
        let mut failed = Vec::new();
        for key in keys {
            match self.enter(StoreOp::Delete, bucket, key) {
                Ok(()) => {
                    lock(&self.objects).remove(&(bucket.to_string(), key.clone()));
                }
                Err(_) => failed.push(key.clone()),
            }
        }
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_is_not_an_error_for_exists() {
        let store = InMemoryObjectStore::new();
        assert_eq!(store.exists("b", "k"), Ok(false));
        store.put_object("b", "k", b"data".to_vec());
        assert_eq!(store.exists("b", "k"), Ok(true));
    }

    #[test]
    fn upload_then_download_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.bam");
        let dst = dir.path().join("out.bam");
        std::fs::write(&src, b"BAM\x01").unwrap();
        let store = InMemoryObjectStore::new();
        store.upload(&src, "b", "k.bam").unwrap();
        store.download("b", "k.bam", &dst).unwrap();
        assert_eq!(std::fs::read(dst).unwrap(), b"BAM\x01");
        assert!(store.download("b", "missing", &src).unwrap_err().is_not_found());
    }

    #[test]
    fn injected_faults_are_transient_and_partial_for_batch_delete() {
        let store = InMemoryObjectStore::new();
        store.put_object("b", "keep/x", b"1".to_vec());
        store.put_object("b", "drop/y", b"2".to_vec());
        store.inject_fault(StoreOp::Delete, "keep/", "access denied");
        let failed = store.batch_delete("b", &["keep/x".to_string(), "drop/y".to_string()]).unwrap();
        assert_eq!(failed, vec!["keep/x".to_string()]);
        assert_eq!(store.keys("b"), vec!["keep/x".to_string()]);

        store.inject_fault(StoreOp::Exists, "keep/", "throttled");
        let err = store.exists("b", "keep/x").unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(store.count_calls(StoreOp::Exists), 1);
    }

    #[test]
    fn bounded_faults_stop_after_their_count() {
        let store = InMemoryObjectStore::new();
        store.put_object("b", "k", b"1".to_vec());
        store.inject_fault_times(StoreOp::Exists, "k", "throttled", 2);
        assert!(store.exists("b", "k").is_err());
        assert!(store.exists("b", "k").is_err());
        assert_eq!(store.exists("b", "k"), Ok(true));
        assert_eq!(store.count_calls(StoreOp::Exists), 3);
    }
}
