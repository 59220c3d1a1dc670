use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use gvcf_flow::app;
use gvcf_flow::cli::Cli;
use gvcf_flow::config::{self, AppConfig};

fn main() -> ExitCode {
    config::init_dotenv();
    gvcf_flow::logging::init();
    let cli = Cli::parse();

    let result = AppConfig::from_env().and_then(|env| app::run(&cli, &env));
    match result {
        Ok(summary) => {
            info!("Run {} finished: {} cache hits, {} computed units, {} tool invocations",
                  summary.run_id,
                  summary.cache_hits,
                  summary.computed_units,
                  summary.tool_invocations);
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => error!("could not serialize run summary: {e}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}
