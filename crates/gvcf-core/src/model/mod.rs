//! Modelo de datos: muestra, read groups, particiones, artifacts y corrida.

pub mod artifact;
pub mod partition;
pub mod read_group;
pub mod run;
pub mod sample;

pub use artifact::{Artifact, ArtifactKind};
pub use partition::Partition;
pub use read_group::{FastqPair, ReadGroup};
pub use run::{CacheOutcome, PipelineRun, UnitId, UnitRecord};
pub use sample::{ObjectLocation, Sample};
