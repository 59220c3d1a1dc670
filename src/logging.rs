//! Inicialización de logging: `env_logger` con filtro `info` por defecto
//! (`RUST_LOG` lo sobreescribe) y formato
//! `<timestamp> <módulo>::<línea> [NIVEL] mensaje`.
use std::io::Write;

use env_logger::{Builder, Env};
use log::Record;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn init() {
    // Un segundo init (tests) no es un error.
    let _ = builder().try_init();
}

pub fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
               let now = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
               writeln!(buf, "{}", render(&now, record))
           });
    builder
}

fn render(timestamp: &str, record: &Record) -> String {
    format!("{timestamp} {}::{} [{}] {}",
            record.module_path().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.level(),
            record.args())
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    #[test]
    fn line_format() {
        let line = render("2024-01-01 00:00:00.000",
                          &Record::builder().args(format_args!("Cache hit for partition X"))
                                            .level(Level::Info)
                                            .module_path(Some("gvcf_core::stage"))
                                            .line(Some(57))
                                            .build());
        assert_eq!(line, "2024-01-01 00:00:00.000 gvcf_core::stage::57 [INFO] Cache hit for partition X");
    }
}
