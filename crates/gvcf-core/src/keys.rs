//! Derivación determinista de keys de cache.
//!
//! Una key es función pura de (muestra, read group | partición, tipo de
//! artifact). Las plantillas aceptan exactamente las variables `{sample}`,
//! `{run}` y `{chrom}`; `{{` y `}}` producen llaves literales. Cualquier otra
//! variable es un error de configuración.
use std::fmt;

use crate::constants::{ALIGNMENT_INDEX_EXT, CALL_INDEX_EXT};
use crate::errors::PipelineError;
use crate::model::{ArtifactKind, Partition, ReadGroup, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVar {
    Sample,
    Run,
    Chrom,
}

impl TemplateVar {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "sample" => Some(Self::Sample),
            "run" => Some(Self::Run),
            "chrom" => Some(Self::Chrom),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateVar::Sample => "sample",
            TemplateVar::Run => "run",
            TemplateVar::Chrom => "chrom",
        };
        write!(f, "{{{name}}}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(TemplateVar),
}

/// Plantilla de key ya validada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl KeyTemplate {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(PipelineError::Config(format!("unclosed `{{` in key template `{raw}`")))
                            }
                        }
                    }
                    let var = TemplateVar::parse(&name).ok_or_else(|| {
                                  PipelineError::Config(format!("unknown variable `{{{name}}}` in key template `{raw}`"))
                              })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Var(var));
                }
                '}' => return Err(PipelineError::Config(format!("single `}}` in key template `{raw}`"))),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if segments.is_empty() {
            return Err(PipelineError::Config("key template must not be empty".into()));
        }
        Ok(Self { raw: raw.to_string(),
                  segments })
    }

    pub fn uses(&self, var: TemplateVar) -> bool {
        self.segments.iter().any(|s| *s == Segment::Var(var))
    }

    fn variables(&self) -> impl Iterator<Item = TemplateVar> + '_ {
        self.segments.iter().filter_map(|s| match s {
                                 Segment::Var(v) => Some(*v),
                                 Segment::Literal(_) => None,
                             })
    }

    fn render(&self, sample: &str, unit: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + sample.len() + unit.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(l) => out.push_str(l),
                Segment::Var(TemplateVar::Sample) => out.push_str(sample),
                Segment::Var(_) => out.push_str(unit),
            }
        }
        out
    }

    /// Exige que la plantilla use `unit_var` y sólo admita `{sample}` además.
    fn require_unit(self, unit_var: TemplateVar, option: &str) -> Result<Self, PipelineError> {
        if let Some(bad) = self.variables().find(|v| *v != unit_var && *v != TemplateVar::Sample) {
            return Err(PipelineError::Config(format!("{option} template `{}` cannot use {bad}", self.raw)));
        }
        if !self.uses(unit_var) {
            return Err(PipelineError::Config(format!("{option} template `{}` must contain {unit_var}", self.raw)));
        }
        Ok(self)
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Derivación de keys para alineamientos y llamadas por partición.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    alignment: KeyTemplate,
    partition_call: KeyTemplate,
}

impl CacheKeys {
    pub fn new(bam_template: &str, gvcf_template: &str) -> Result<Self, PipelineError> {
        Ok(Self { alignment: KeyTemplate::parse(bam_template)?.require_unit(TemplateVar::Run, "bam_key")?,
                  partition_call: KeyTemplate::parse(gvcf_template)?.require_unit(TemplateVar::Chrom, "gvcf_key")? })
    }

    pub fn alignment_key(&self, sample: &Sample, read_group: &ReadGroup) -> String {
        self.alignment.render(sample.name(), read_group.id())
    }

    pub fn partition_call_key(&self, sample: &Sample, partition: Partition) -> String {
        self.partition_call.render(sample.name(), partition.label())
    }

    /// Key remota de un artifact de read group.
    pub fn for_read_group(&self, sample: &Sample, read_group: &ReadGroup, kind: ArtifactKind) -> Option<String> {
        let key = self.alignment_key(sample, read_group);
        match kind {
            ArtifactKind::Alignment => Some(key),
            ArtifactKind::AlignmentIndex => Some(format!("{key}{ALIGNMENT_INDEX_EXT}")),
            _ => None,
        }
    }

    /// Key remota de un artifact de partición.
    pub fn for_partition(&self, sample: &Sample, partition: Partition, kind: ArtifactKind) -> Option<String> {
        let key = self.partition_call_key(sample, partition);
        match kind {
            ArtifactKind::PartitionCall => Some(key),
            ArtifactKind::PartitionCallIndex => Some(format!("{key}{CALL_INDEX_EXT}")),
            _ => None,
        }
    }
}
