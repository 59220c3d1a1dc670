//! Read groups y pares de FASTQ.
//!
//! Convención de nombres (bit-exacta): el primer mate termina en
//! `1.filt.fastq.gz`; el segundo se obtiene reemplazando ese sufijo de 15
//! caracteres por `2.filt.fastq.gz`. El id del read group es el nombre base
//! sin sus 16 caracteres finales.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MATE1_SUFFIX, MATE2_SUFFIX, READ_GROUP_TRIM};
use crate::errors::PipelineError;

use super::sample::ObjectLocation;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadGroup {
    id: String,
}

impl ReadGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Deriva el id a partir del nombre base del primer mate.
    pub fn from_file_name(file_name: &str) -> Result<Self, PipelineError> {
        if !file_name.ends_with(MATE1_SUFFIX) {
            return Err(PipelineError::InvalidInput(format!("`{file_name}` does not end with `{MATE1_SUFFIX}`")));
        }
        // Se recortan caracteres, no bytes: el nombre puede no ser ASCII.
        match file_name.char_indices().rev().nth(READ_GROUP_TRIM - 1) {
            Some((cut, _)) if cut > 0 => Ok(Self::new(&file_name[..cut])),
            _ => Err(PipelineError::InvalidInput(format!("`{file_name}` is too short to carry a read group id"))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header `@RG` para el alineador, con escapes `\t` literales.
    pub fn header(&self, sample: &str) -> String {
        format!("@RG\\tID:{}\\tSM:{}", self.id, sample)
    }
}

impl fmt::Display for ReadGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Par de lecturas paired-end de un read group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastqPair {
    pub read_group: ReadGroup,
    pub first: ObjectLocation,
    pub second: ObjectLocation,
}

impl FastqPair {
    /// Construye el par a partir del localizador del primer mate.
    pub fn from_locator(locator: &str) -> Result<Self, PipelineError> {
        let first = ObjectLocation::parse(locator)?;
        let read_group = ReadGroup::from_file_name(first.file_name())?;
        let stem = &first.key[..first.key.len() - MATE1_SUFFIX.len()];
        let second = ObjectLocation::new(first.bucket.clone(), format!("{stem}{MATE2_SUFFIX}"));
        Ok(Self { read_group,
                  first,
                  second })
    }
}
