//! Política de reintento acotada para llamadas al store.
//!
//! Sólo se reintenta `StoreError::Transient`. `NotFound` nunca se reintenta
//! (es la señal de cache miss) y los fallos de tools no pasan por aquí.
//! Con `max_retries = 0` (default) todo error del store es fatal al primer
//! intento.
use std::thread;
use std::time::Duration;

use log::warn;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0,
               base_delay: Duration::from_millis(250) }
    }

    pub fn with_retries(max_retries: u32) -> Self {
        Self { max_retries,
               ..Self::none() }
    }

    /// Ejecuta `f`, repitiendo ante errores transitorios con backoff lineal
    /// (`base_delay * intento`).
    pub fn run<T, F>(&self, mut f: F) -> Result<T, StoreError>
        where F: FnMut() -> Result<T, StoreError>
    {
        let mut attempts = 0;
        loop {
            match f() {
                Err(e) if !e.is_not_found() && attempts < self.max_retries => {
                    attempts += 1;
                    let delay = self.base_delay * attempts;
                    warn!("retryable store error (attempt {attempts}): {e} -> sleeping {}ms", delay.as_millis());
                    thread::sleep(delay);
                }
                r => return r,
            }
        }
    }
}
