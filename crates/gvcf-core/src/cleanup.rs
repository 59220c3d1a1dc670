//! Recuperación de almacenamiento transitorio, local y remoto.
//!
//! Ningún fallo de limpieza escala a error de corrida: se registra con
//! `warn!` y queda en el `CleanupReport`.
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::store::ObjectStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed_local: Vec<PathBuf>,
    pub missing_local: Vec<PathBuf>,
    pub failed_local: Vec<(PathBuf, String)>,
    pub deleted_remote: Vec<String>,
    pub failed_remote: Vec<String>,
}

impl CleanupReport {
    pub fn absorb(&mut self, other: CleanupReport) {
        self.removed_local.extend(other.removed_local);
        self.missing_local.extend(other.missing_local);
        self.failed_local.extend(other.failed_local);
        self.deleted_remote.extend(other.deleted_remote);
        self.failed_remote.extend(other.failed_remote);
    }

    /// Sin fallos (los archivos ya ausentes no cuentan como fallo).
    pub fn is_clean(&self) -> bool {
        self.failed_local.is_empty() && self.failed_remote.is_empty()
    }
}

pub struct CleanupCoordinator;

impl CleanupCoordinator {
    /// Borrado idempotente de archivos locales.
    pub fn remove_local<I>(paths: I) -> CleanupReport
        where I: IntoIterator<Item = PathBuf>
    {
        let mut report = CleanupReport::default();
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removing {}", path.display());
                    report.removed_local.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("{} was already removed", path.display());
                    report.missing_local.push(path);
                }
                Err(e) => {
                    warn!("could not remove {}: {e}", path.display());
                    report.failed_local.push((path, e.to_string()));
                }
            }
        }
        report
    }

    /// Borrado best-effort en lote. Un error global del store marca todas
    /// las keys como fallidas.
    pub fn remove_remote<S: ObjectStore + ?Sized>(store: &S, bucket: &str, keys: &[String]) -> CleanupReport {
        let mut report = CleanupReport::default();
        if keys.is_empty() {
            return report;
        }
        info!("Cleaning up {} objects in bucket {bucket}", keys.len());
        let failed = match store.batch_delete(bucket, keys) {
            Ok(failed) => failed,
            Err(e) => {
                warn!("The deletion operation failed: {e}");
                keys.to_vec()
            }
        };
        if !failed.is_empty() {
            warn!("The deletion operation returned errors for {} keys: {failed:?}", failed.len());
        }
        report.deleted_remote = keys.iter().filter(|k| !failed.contains(k)).cloned().collect();
        report.failed_remote = failed;
        report
    }
}
