//! logship -- turn Avro session events into Logstash-style search documents.
//!
//! # Exit Codes
//!
//! See [`error::CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use logship_core::config::{GeneralConfig, LogshipConfig};

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only [general] is needed here; commands report their own config errors.
    let general = match LogshipConfig::load(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig::default(),
    };

    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("logship: {}", e);
        std::process::exit(1);
    }

    logship_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);

    let result = match cli.command {
        Commands::Project(args) => commands::project::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("logship: {}", e);
        std::process::exit(e.exit_code());
    }
}
