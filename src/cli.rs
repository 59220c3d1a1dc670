//! Superficie de línea de comandos.
use std::path::PathBuf;

use clap::Parser;

use gvcf_core::constants::{DEFAULT_BAM_KEY, DEFAULT_GVCF_KEY};

#[derive(Debug, Parser)]
#[command(name = "gvcf-flow")]
#[command(about = "Align paired FASTQs and call a genome-wide GVCF, resuming from an S3 cache", long_about = None)]
pub struct Cli {
    /// Genoma de referencia indexado para bwa.
    pub reference: PathBuf,
    pub access_key: String,
    pub secret_key: String,
    /// Destino del GVCF final (`s3://bucket/key`). Su bucket aloja la cache.
    pub upload_location: String,
    pub sample_name: String,
    /// Primer mate de cada par (`s3://bucket/.../<rg>_1.filt.fastq.gz`).
    #[arg(required = true)]
    pub input_fastq: Vec<String>,

    #[arg(long, default_value_t = 8)]
    pub threads: u32,
    #[arg(long = "sort_mem", default_value = "128M")]
    pub sort_mem: String,
    #[arg(long = "call_vars_mem", default_value = "3g")]
    pub call_vars_mem: String,
    #[arg(long, default_value = "/usr/local/bin/GenomeAnalysisTK.jar")]
    pub gatk: PathBuf,
    /// Template de key para BAMs; variables `{sample}` y `{run}`.
    #[arg(long = "bam_key", default_value = DEFAULT_BAM_KEY)]
    pub bam_key: String,
    /// Template de key para GVCFs por partición; variables `{sample}` y `{chrom}`.
    #[arg(long = "gvcf_key", default_value = DEFAULT_GVCF_KEY)]
    pub gvcf_key: String,

    /// Sobreescribe `GVCF_SCRATCH_DIR`.
    #[arg(long = "scratch_dir")]
    pub scratch_dir: Option<PathBuf>,
    /// Sobreescribe `GVCF_STORE_RETRIES`.
    #[arg(long = "store_retries")]
    pub store_retries: Option<u32>,
    /// Vuelca los eventos de la corrida como JSON lines.
    #[arg(long = "events_out")]
    pub events_out: Option<PathBuf>,
}
