//! Entradas validadas de una corrida.
use std::collections::HashSet;
use std::path::PathBuf;

use crate::constants::DEFAULT_SCRATCH_DIR;
use crate::errors::PipelineError;
use crate::keys::CacheKeys;
use crate::model::{FastqPair, ObjectLocation, ReadGroup, Sample};
use crate::retry::RetryPolicy;
use crate::tool::ToolSettings;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample: Sample,
    pub inputs: Vec<FastqPair>,
    /// Entregable final. Su bucket es además el bucket de la cache.
    pub deliverable: ObjectLocation,
    pub keys: CacheKeys,
    pub tools: ToolSettings,
    pub scratch_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn new<S: AsRef<str>>(sample: Sample,
                              input_fastqs: &[S],
                              upload_location: &str,
                              keys: CacheKeys,
                              tools: ToolSettings)
                              -> Result<Self, PipelineError> {
        if input_fastqs.is_empty() {
            return Err(PipelineError::InvalidInput("at least one input fastq is required".into()));
        }
        let inputs = input_fastqs.iter()
                                 .map(|l| FastqPair::from_locator(l.as_ref()))
                                 .collect::<Result<Vec<_>, _>>()?;
        let mut seen = HashSet::new();
        if let Some(dup) = inputs.iter().find(|p| !seen.insert(p.read_group.clone())) {
            return Err(PipelineError::InvalidInput(format!("read group `{}` appears more than once", dup.read_group)));
        }
        Ok(Self { sample,
                  inputs,
                  deliverable: ObjectLocation::parse(upload_location)?,
                  keys,
                  tools,
                  scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
                  retry: RetryPolicy::none() })
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache_bucket(&self) -> &str {
        &self.deliverable.bucket
    }

    pub fn read_groups(&self) -> Vec<ReadGroup> {
        self.inputs.iter().map(|p| p.read_group.clone()).collect()
    }
}
