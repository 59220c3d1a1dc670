//! Construcción de las invocaciones de cada etapa.
//!
//! El core fija los parámetros lógicos (hilos, memoria, rutas, referencia);
//! el comportamiento interno de cada herramienta queda fuera.
use std::path::{Path, PathBuf};

use crate::constants::{ALIGNMENT_INDEX_EXT, CALL_INDEX_EXT};
use crate::model::{Partition, ReadGroup, Sample};

use super::invocation::{CommandLine, Invocation, ToolKind};

/// Anotaciones que se piden al llamador de variantes.
const HAPLOTYPE_ANNOTATIONS: [&str; 8] = ["AlleleBalance",
                                          "TandemRepeatAnnotator",
                                          "ClippingRankSumTest",
                                          "GCContent",
                                          "MappingQualityZero",
                                          "SpanningDeletions",
                                          "StrandOddsRatio",
                                          "AlleleBalanceBySample"];

const VARIANT_INDEX_ARGS: [&str; 4] = ["--variant_index_type", "LINEAR", "--variant_index_parameter", "128000"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub reference: PathBuf,
    pub threads: u32,
    pub sort_mem: String,
    pub call_vars_mem: String,
    pub gatk_jar: PathBuf,
    pub bwa: String,
    pub samblaster: String,
    pub samtools: String,
    pub java: String,
}

impl ToolSettings {
    pub fn new(reference: impl Into<PathBuf>, gatk_jar: impl Into<PathBuf>) -> Self {
        Self { reference: reference.into(),
               threads: 8,
               sort_mem: "128M".into(),
               call_vars_mem: "3g".into(),
               gatk_jar: gatk_jar.into(),
               bwa: "bwa".into(),
               samblaster: "samblaster".into(),
               samtools: "samtools".into(),
               java: "java".into() }
    }

    /// `bwa mem | samblaster | samtools view | samtools sort` hacia `out`.
    pub fn align(&self, sample: &Sample, read_group: &ReadGroup, fq1: &Path, fq2: &Path, out: &Path) -> Invocation {
        let threads = self.threads.to_string();
        let stages = vec![CommandLine::new(&self.bwa).args(["mem", "-t", threads.as_str(), "-R"])
                                                     .arg(read_group.header(sample.name()))
                                                     .path_arg(&self.reference)
                                                     .path_arg(fq1)
                                                     .path_arg(fq2),
                          CommandLine::new(&self.samblaster),
                          CommandLine::new(&self.samtools).args(["view", "-b", "-u", "/dev/stdin"]),
                          CommandLine::new(&self.samtools).args(["sort", "-@", threads.as_str(), "-m", self.sort_mem.as_str(), "-O",
                                                                 "BAM", "-o"])
                                                          .path_arg(out)
                                                          .arg("/dev/stdin"),];
        Invocation::pipeline(ToolKind::Align, stages).with_outputs([out.to_path_buf()])
    }

    pub fn index_alignment(&self, bam: &Path) -> Invocation {
        Invocation::single(ToolKind::IndexAlignment,
                           CommandLine::new(&self.samtools).arg("index").path_arg(bam))
        .with_outputs([with_suffix(bam, ALIGNMENT_INDEX_EXT)])
    }

    /// HaplotypeCaller en modo GVCF restringido a `partition`, con el set
    /// completo de BAMs como entrada.
    pub fn call_partition(&self, partition: Partition, bams: &[PathBuf], out: &Path) -> Invocation {
        let mut cmd = CommandLine::new(&self.java).arg(format!("-Xmx{}", self.call_vars_mem))
                                                  .arg("-jar")
                                                  .path_arg(&self.gatk_jar)
                                                  .args(["-T", "HaplotypeCaller", "-R"])
                                                  .path_arg(&self.reference);
        for bam in bams {
            cmd = cmd.arg("-I").path_arg(bam);
        }
        cmd = cmd.arg("-o")
                 .path_arg(out)
                 .args(["--emitRefConfidence", "GVCF", "-L", partition.label()])
                 .args(VARIANT_INDEX_ARGS)
                 .args(["-G", "StandardAnnotation"]);
        for annotation in HAPLOTYPE_ANNOTATIONS {
            cmd = cmd.args(["-A", annotation]);
        }
        Invocation::single(ToolKind::CallPartition, cmd).with_outputs([out.to_path_buf(),
                                                                       with_suffix(out, CALL_INDEX_EXT)])
    }

    /// CatVariants sobre los GVCF parciales, en el orden recibido.
    pub fn merge_calls(&self, gvcfs: &[PathBuf], out: &Path) -> Invocation {
        let mut cmd = CommandLine::new(&self.java).arg(format!("-Xmx{}", self.call_vars_mem))
                                                  .arg("-cp")
                                                  .path_arg(&self.gatk_jar)
                                                  .arg("org.broadinstitute.gatk.tools.CatVariants")
                                                  .arg("-R")
                                                  .path_arg(&self.reference)
                                                  .arg("-o")
                                                  .path_arg(out);
        for gvcf in gvcfs {
            cmd = cmd.arg("-V").path_arg(gvcf);
        }
        cmd = cmd.arg("--assumeSorted").args(VARIANT_INDEX_ARGS);
        Invocation::single(ToolKind::MergeCalls, cmd).with_outputs([out.to_path_buf(), with_suffix(out, CALL_INDEX_EXT)])
    }
}

/// `path` + `suffix` sin tocar la extensión existente.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
