//! Armado de una corrida a partir de la CLI y del entorno.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use gvcf_adapters::{ProcessInvoker, RemoteObjectStore, S3Credentials};
use gvcf_core::{CacheKeys, PipelineConfig, PipelineOrchestrator, RetryPolicy, RunEvent, RunSummary, Sample,
                ToolSettings};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::errors::AppError;

pub fn tool_settings(cli: &Cli, env: &AppConfig) -> ToolSettings {
    let mut tools = ToolSettings::new(&cli.reference, &cli.gatk);
    tools.threads = cli.threads;
    tools.sort_mem = cli.sort_mem.clone();
    tools.call_vars_mem = cli.call_vars_mem.clone();
    tools.bwa = env.bwa.clone();
    tools.samblaster = env.samblaster.clone();
    tools.samtools = env.samtools.clone();
    tools.java = env.java.clone();
    tools
}

pub fn pipeline_config(cli: &Cli, env: &AppConfig) -> Result<PipelineConfig, AppError> {
    let keys = CacheKeys::new(&cli.bam_key, &cli.gvcf_key)?;
    let sample = Sample::new(cli.sample_name.as_str())?;
    let scratch = cli.scratch_dir.clone().unwrap_or_else(|| env.scratch_dir.clone());
    let retries = cli.store_retries.unwrap_or(env.store_retries);
    let config = PipelineConfig::new(sample,
                                     cli.input_fastq.as_slice(),
                                     &cli.upload_location,
                                     keys,
                                     tool_settings(cli, env))?;
    Ok(config.with_scratch_dir(scratch).with_retry(RetryPolicy::with_retries(retries)))
}

pub fn open_store(cli: &Cli, env: &AppConfig) -> Result<RemoteObjectStore, AppError> {
    let credentials = S3Credentials { access_key: cli.access_key.clone(),
                                      secret_key: cli.secret_key.clone() };
    Ok(RemoteObjectStore::new(env.backend.clone(), Some(credentials))?)
}

/// Ejecuta la corrida completa con los adaptadores reales.
pub fn run(cli: &Cli, env: &AppConfig) -> Result<RunSummary, AppError> {
    let config = pipeline_config(cli, env)?;
    fs::create_dir_all(&config.scratch_dir)?;
    let store = open_store(cli, env)?;
    let mut orchestrator = PipelineOrchestrator::new(config, store, ProcessInvoker::new());
    info!("Run {} started for sample {}", orchestrator.run_id(), cli.sample_name);

    let result = orchestrator.run();
    if let Some(path) = &cli.events_out {
        if let Err(e) = write_events(path, &orchestrator.events()) {
            warn!("could not write events to {}: {e}", path.display());
        }
    }
    Ok(result?)
}

/// Una línea JSON por evento.
pub fn write_events(path: &Path, events: &[RunEvent]) -> Result<(), AppError> {
    let mut out = BufWriter::new(File::create(path)?);
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
