//! Constantes del pipeline.
//!
//! Estos valores forman parte del contrato observable: nombres de mates,
//! orden de particiones y extensiones de índices. Cambiarlos rompe la
//! compatibilidad con caches remotas ya pobladas.

/// Versión lógica del motor. Se incluye en el fingerprint de la corrida.
pub const ENGINE_VERSION: &str = "G1.0";

/// Enumeración fija de particiones (autosomas 0..=22, X, Y, MT). El merge
/// concatena exactamente en este orden.
pub const PARTITION_LABELS: [&str; 26] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
                                          "13", "14", "15", "16", "17", "18", "19", "20", "21", "22", "X", "Y",
                                          "MT"];

/// Sufijo del primer mate de un par.
pub const MATE1_SUFFIX: &str = "1.filt.fastq.gz";
/// Sufijo del segundo mate; reemplaza a `MATE1_SUFFIX`.
pub const MATE2_SUFFIX: &str = "2.filt.fastq.gz";
/// Caracteres finales que se descartan del nombre base para obtener el id
/// del read group (el sufijo más su separador).
pub const READ_GROUP_TRIM: usize = 16;

/// Extensión del índice de un alineamiento.
pub const ALIGNMENT_INDEX_EXT: &str = ".bai";
/// Extensión del índice de un GVCF (parcial o mergeado).
pub const CALL_INDEX_EXT: &str = ".tbi";

pub const DEFAULT_BAM_KEY: &str = "1000genomes/BAM/{sample}/{run}.bam";
pub const DEFAULT_GVCF_KEY: &str = "1000genomes/gVCF/{sample}/{sample}_{chrom}.g.vcf.gz";
pub const DEFAULT_SCRATCH_DIR: &str = "/ephemeral";
