//! Identidad de la muestra y localizadores de objetos remotos.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Muestra analizada. Dueña de la corrida completa.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    name: String,
}

impl Sample {
    pub fn new(name: impl Into<String>) -> Result<Self, PipelineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::InvalidInput("sample name must not be empty".into()));
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Objeto remoto identificado por bucket + key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self { bucket: bucket.into(),
               key: key.into() }
    }

    /// Acepta `s3://bucket/key` o `bucket/key`. El bucket es el texto previo
    /// al primer `/` tras el esquema opcional.
    pub fn parse(locator: &str) -> Result<Self, PipelineError> {
        let rest = locator.strip_prefix("s3://").unwrap_or(locator);
        let (bucket, key) = rest.split_once('/')
                                .ok_or_else(|| PipelineError::InvalidInput(format!("locator `{locator}` has no key")))?;
        if bucket.is_empty() || key.is_empty() {
            return Err(PipelineError::InvalidInput(format!("locator `{locator}` needs both bucket and key")));
        }
        Ok(Self::new(bucket, key))
    }

    /// Último componente de la key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Misma ubicación con un sufijo agregado a la key (índices).
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(self.bucket.clone(), format!("{}{}", self.key, suffix))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
