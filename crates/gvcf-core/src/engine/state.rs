use serde::{Deserialize, Serialize};

/// Estado del orquestador.
///
/// La secuencia es estricta y sin retrocesos:
/// `Start` -> `AligningReadGroups` -> `AllAlignmentsReady` ->
/// `CallingPartitions` -> `AllPartitionCallsReady` -> `Merging` ->
/// `UploadingFinal` -> `CleaningUp` -> `Done`.
///
/// Un error fatal deja el estado donde ocurrió; nunca se pasa a
/// `CleaningUp` tras un fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Start,
    AligningReadGroups,
    AllAlignmentsReady,
    CallingPartitions,
    AllPartitionCallsReady,
    Merging,
    UploadingFinal,
    CleaningUp,
    Done,
}

impl PipelineState {
    /// Único sucesor válido.
    pub fn next(self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Start => Some(AligningReadGroups),
            AligningReadGroups => Some(AllAlignmentsReady),
            AllAlignmentsReady => Some(CallingPartitions),
            CallingPartitions => Some(AllPartitionCallsReady),
            AllPartitionCallsReady => Some(Merging),
            Merging => Some(UploadingFinal),
            UploadingFinal => Some(CleaningUp),
            CleaningUp => Some(Done),
            Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PipelineState::Done
    }
}
