//! gvcf-core: máquina de estados reanudable del pipeline FASTQ -> GVCF.
//!
//! Decide, por cada unidad de trabajo, si descargar un artifact previo de la
//! cache remota o calcularlo; deriva las keys de cache de forma
//! determinista; ordena las etapas y sus dependencias; y limpia el
//! almacenamiento transitorio local y remoto.
//!
//! Las herramientas externas y el transporte del store son capacidades
//! (`ToolInvoker`, `ObjectStore`) implementadas fuera de este crate.
pub mod cleanup;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod keys;
pub mod model;
pub mod retry;
pub mod stage;
pub mod store;
pub mod tool;

pub use cleanup::{CleanupCoordinator, CleanupReport};
pub use engine::{PipelineConfig, PipelineOrchestrator, PipelineState, RunSummary};
pub use errors::PipelineError;
pub use event::{InMemoryRunEventStore, RunEvent, RunEventKind, RunEventStore};
pub use keys::CacheKeys;
pub use model::{Artifact, ArtifactKind, FastqPair, ObjectLocation, Partition, ReadGroup, Sample};
pub use retry::RetryPolicy;
pub use stage::{ResumableStage, WorkUnit};
pub use store::{InMemoryObjectStore, ObjectStore, StoreError, StoreOp};
pub use tool::{Invocation, ToolInvoker, ToolKind, ToolSettings};
