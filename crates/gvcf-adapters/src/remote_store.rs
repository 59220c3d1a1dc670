//! `ObjectStore` del core sobre el crate `object_store`.
//!
//! Cada bucket se resuelve a una instancia del backend la primera vez que se
//! usa y se reutiliza después. Las llamadas son bloqueantes: un runtime de
//! tokio propio ejecuta las operaciones async del backend.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::try_join_all;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{DynObjectStore, MultipartUpload as _, ObjectStore as _, PutPayload};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::{Builder, Runtime};

use gvcf_core::{ObjectStore, StoreError, StoreOp};

use crate::error::AdapterError;

/// Tamaño de cada parte en subidas multipart.
const UPLOAD_CHUNK: usize = 8 * 1024 * 1024;
/// Partes en vuelo por subida.
const UPLOAD_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Backend seleccionado por configuración: `s3` o `local:<directorio>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    S3 {
        region: Option<String>,
        endpoint: Option<String>,
    },
    Local { root: PathBuf },
}

impl StoreBackend {
    pub fn parse(spec: &str) -> Result<Self, AdapterError> {
        match spec.trim() {
            "s3" => Ok(StoreBackend::S3 { region: None,
                                          endpoint: None }),
            other => match other.strip_prefix("local:") {
                Some(root) if !root.is_empty() => Ok(StoreBackend::Local { root: PathBuf::from(root) }),
                _ => Err(AdapterError::Backend(format!("`{other}` (se espera `s3` o `local:<dir>`)"))),
            },
        }
    }
}

pub struct RemoteObjectStore {
    runtime: Runtime,
    backend: StoreBackend,
    credentials: Option<S3Credentials>,
    buckets: Mutex<HashMap<String, Arc<DynObjectStore>>>,
}

impl RemoteObjectStore {
    pub fn new(backend: StoreBackend, credentials: Option<S3Credentials>) -> Result<Self, AdapterError> {
        if let StoreBackend::Local { root } = &backend {
            fs::create_dir_all(root)?;
        }
        let runtime = Builder::new_current_thread().enable_all().build()?;
        info!("Object store backend: {backend:?}");
        Ok(Self { runtime,
                  backend,
                  credentials,
                  buckets: Mutex::new(HashMap::new()) })
    }

    pub fn s3(credentials: S3Credentials, region: Option<String>, endpoint: Option<String>) -> Result<Self, AdapterError> {
        Self::new(StoreBackend::S3 { region, endpoint }, Some(credentials))
    }

    pub fn local(root: impl Into<PathBuf>) -> Result<Self, AdapterError> {
        Self::new(StoreBackend::Local { root: root.into() }, None)
    }

    fn bucket(&self, op: StoreOp, bucket: &str, key: &str) -> Result<Arc<DynObjectStore>, StoreError> {
        let mut cache = self.buckets.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(store) = cache.get(bucket) {
            return Ok(Arc::clone(store));
        }
        let built = self.build(bucket).map_err(|e| StoreError::transient(op, bucket, key, e))?;
        cache.insert(bucket.to_string(), Arc::clone(&built));
        Ok(built)
    }

    fn build(&self, bucket: &str) -> Result<Arc<DynObjectStore>, String> {
        match &self.backend {
            StoreBackend::S3 { region, endpoint } => {
                let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
                if let Some(creds) = &self.credentials {
                    builder = builder.with_access_key_id(&creds.access_key)
                                     .with_secret_access_key(&creds.secret_key);
                }
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint)
                                     .with_allow_http(endpoint.starts_with("http://"));
                }
                let store = builder.build().map_err(|e| format!("failed to build S3 store: {e}"))?;
                Ok(Arc::new(store))
            }
            StoreBackend::Local { root } => {
                let dir = root.join(bucket);
                fs::create_dir_all(&dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;
                let store = LocalFileSystem::new_with_prefix(&dir).map_err(|e| format!("failed to create local store: {e}"))?;
                Ok(Arc::new(store))
            }
        }
    }
}

fn classify(op: StoreOp, bucket: &str, key: &str, err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::not_found(bucket, key),
        other => StoreError::transient(op, bucket, key, other.to_string()),
    }
}

fn io_failure(op: StoreOp, bucket: &str, key: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::transient(op, bucket, key, format!("{}: {err}", path.display()))
}

/// La key se usa tal cual: `Path::from` codificaría `{`, `[`, `#`, etc.
fn location(op: StoreOp, bucket: &str, key: &str) -> Result<ObjectPath, StoreError> {
    ObjectPath::parse(key).map_err(|e| StoreError::transient(op, bucket, key, format!("invalid object key: {e}")))
}

/// Llena `buf` salvo al final del archivo. Devuelve los bytes leídos.
async fn fill(file: &mut tokio::fs::File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

impl ObjectStore for RemoteObjectStore {
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let store = self.bucket(StoreOp::Exists, bucket, key)?;
        let location = location(StoreOp::Exists, bucket, key)?;
        match self.runtime.block_on(store.head(&location)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(classify(StoreOp::Exists, bucket, key, e)),
        }
    }

    fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError> {
        const OP: StoreOp = StoreOp::Download;
        let store = self.bucket(OP, bucket, key)?;
        let location = location(OP, bucket, key)?;
        info!("Downloading s3://{bucket}/{key} to {}", local_path.display());
        self.runtime.block_on(async {
                        let result = store.get(&location).await.map_err(|e| classify(OP, bucket, key, e))?;
                        let mut stream = result.into_stream();
                        let mut file = tokio::fs::File::create(local_path).await
                                                                          .map_err(|e| io_failure(OP, bucket, key, local_path, e))?;
                        while let Some(chunk) = stream.next().await {
                            let chunk = chunk.map_err(|e| classify(OP, bucket, key, e))?;
                            file.write_all(&chunk).await.map_err(|e| io_failure(OP, bucket, key, local_path, e))?;
                        }
                        file.flush().await.map_err(|e| io_failure(OP, bucket, key, local_path, e))
                    })
    }

    /// Subida multipart. Ante cualquier fallo posterior a iniciarla se
    /// aborta, para no dejar partes huérfanas en el bucket.
    fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        const OP: StoreOp = StoreOp::Upload;
        let store = self.bucket(OP, bucket, key)?;
        let location = location(OP, bucket, key)?;
        info!("Uploading {} to s3://{bucket}/{key}", local_path.display());
        self.runtime.block_on(async {
                        let mut file = tokio::fs::File::open(local_path).await
                                                                        .map_err(|e| io_failure(OP, bucket, key, local_path, e))?;
                        let mut upload = store.put_multipart(&location).await.map_err(|e| classify(OP, bucket, key, e))?;
                        let sent = async {
                                       let mut buf = vec![0u8; UPLOAD_CHUNK];
                                       let mut in_flight = Vec::with_capacity(UPLOAD_CONCURRENCY);
                                       let mut parts = 0usize;
                                       loop {
                                           let n = fill(&mut file, &mut buf).await
                                                                            .map_err(|e| io_failure(OP, bucket, key, local_path, e))?;
                                           // Un archivo vacío igual sube una parte.
                                           if n == 0 && parts > 0 {
                                               break;
                                           }
                                           in_flight.push(upload.put_part(PutPayload::from(buf[..n].to_vec())));
                                           parts += 1;
                                           if in_flight.len() >= UPLOAD_CONCURRENCY {
                                               try_join_all(in_flight.drain(..)).await
                                                                                .map_err(|e| classify(OP, bucket, key, e))?;
                                           }
                                           if n < UPLOAD_CHUNK {
                                               break;
                                           }
                                       }
                                       try_join_all(in_flight).await.map_err(|e| classify(OP, bucket, key, e))?;
                                       upload.complete().await.map_err(|e| classify(OP, bucket, key, e))?;
                                       Ok::<(), StoreError>(())
                                   }.await;
                        if let Err(e) = &sent {
                            warn!("Aborting multipart upload to s3://{bucket}/{key}: {e}");
                            if let Err(abort) = upload.abort().await {
                                warn!("Could not abort multipart upload to s3://{bucket}/{key}: {abort}");
                            }
                        }
                        sent
                    })
    }

    /// Un único pedido de borrado en lote (S3 agrupa hasta 1000 keys por
    /// request). Los resultados llegan en el orden de entrada.
    fn batch_delete(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StoreError> {
        let store = self.bucket(StoreOp::Delete, bucket, "")?;
        let mut failed = Vec::new();
        let mut targets = Vec::with_capacity(keys.len());
        for key in keys {
            match location(StoreOp::Delete, bucket, key) {
                Ok(path) => targets.push((key, path)),
                Err(e) => {
                    warn!("{e}");
                    failed.push(key.clone());
                }
            }
        }
        let paths: Vec<object_store::Result<ObjectPath>> = targets.iter().map(|(_, p)| Ok(p.clone())).collect();
        let results: Vec<object_store::Result<ObjectPath>> =
            self.runtime.block_on(store.delete_stream(stream::iter(paths).boxed()).collect());
        for (i, (key, _)) in targets.iter().enumerate() {
            match results.get(i) {
                Some(Ok(_)) => debug!("Deleted s3://{bucket}/{key}"),
                Some(Err(object_store::Error::NotFound { .. })) => debug!("s3://{bucket}/{key} was already gone"),
                Some(Err(e)) => {
                    warn!("Could not delete s3://{bucket}/{key}: {e}");
                    failed.push((*key).clone());
                }
                None => {
                    warn!("No deletion result for s3://{bucket}/{key}");
                    failed.push((*key).clone());
                }
            }
        }
        Ok(failed)
    }
}
