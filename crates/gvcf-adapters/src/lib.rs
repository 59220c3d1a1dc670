//! gvcf-adapters: implementaciones concretas de las capacidades del core.
//!
//! - `RemoteObjectStore`: `ObjectStore` sobre el crate `object_store` (S3 o
//!   un directorio local que simula buckets).
//! - `ProcessInvoker`: `ToolInvoker` que encadena procesos con pipes del SO.

pub mod error;
pub mod process;
pub mod remote_store;

pub use error::AdapterError;
pub use process::ProcessInvoker;
pub use remote_store::{RemoteObjectStore, S3Credentials, StoreBackend};
