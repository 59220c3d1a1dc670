//! Configuración de la aplicación.
//! Carga variables de entorno (.env incluido) una sola vez y las expone en
//! `AppConfig`. Los flags de la CLI tienen precedencia sobre estos valores.
use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use gvcf_adapters::StoreBackend;
use gvcf_core::constants::DEFAULT_SCRATCH_DIR;

use crate::errors::AppError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directorio local efímero para FASTQ, BAM y GVCF intermedios.
    pub scratch_dir: PathBuf,
    pub bwa: String,
    pub samblaster: String,
    pub samtools: String,
    pub java: String,
    pub backend: StoreBackend,
    pub store_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Igual que `from_env`, leyendo de una fuente arbitraria.
    pub fn from_lookup<F>(get: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let var = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        let or = |k: &str, default: &str| var(k).unwrap_or_else(|| default.to_string());

        let mut backend = StoreBackend::parse(&or("GVCF_STORE_BACKEND", "s3"))?;
        if let StoreBackend::S3 { region, endpoint } = &mut backend {
            *region = var("GVCF_S3_REGION").or_else(|| var("AWS_REGION"));
            *endpoint = var("GVCF_S3_ENDPOINT");
        }
        let store_retries = match var("GVCF_STORE_RETRIES") {
            Some(v) => v.trim()
                        .parse()
                        .map_err(|_| AppError::Config(format!("GVCF_STORE_RETRIES inválido: `{v}`")))?,
            None => 0,
        };
        Ok(Self { scratch_dir: PathBuf::from(or("GVCF_SCRATCH_DIR", DEFAULT_SCRATCH_DIR)),
                  bwa: or("GVCF_BWA", "bwa"),
                  samblaster: or("GVCF_SAMBLASTER", "samblaster"),
                  samtools: or("GVCF_SAMTOOLS", "samtools"),
                  java: or("GVCF_JAVA", "java"),
                  backend,
                  store_retries })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
