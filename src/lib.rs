//! gvcf-flow
//!
//! Binario y piezas de aplicación alrededor de `gvcf-core`:
//! - `cli`: superficie de línea de comandos.
//! - `config`: variables de entorno (.env incluido).
//! - `app`: arma la corrida con los adaptadores reales.
//! - `errors` y `logging`.

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
