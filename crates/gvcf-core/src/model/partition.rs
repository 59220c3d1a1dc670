//! Particiones genómicas sobre las que se paraleliza el llamado de variantes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::PARTITION_LABELS;

/// Una de las 26 regiones fijas. Se representa por su posición en
/// `PARTITION_LABELS`, de modo que el orden natural coincide con el orden de
/// merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Partition(u8);

impl Partition {
    pub const COUNT: usize = PARTITION_LABELS.len();

    /// Todas las particiones en orden de enumeración.
    pub fn all() -> impl Iterator<Item = Partition> {
        (0..Self::COUNT as u8).map(Partition)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        PARTITION_LABELS.iter().position(|l| *l == label).map(|i| Partition(i as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn label(self) -> &'static str {
        PARTITION_LABELS[self.index()]
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
