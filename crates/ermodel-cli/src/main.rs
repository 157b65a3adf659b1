//! ermodel command-line interface
//!
//! Imports catalog models into a local versioned store and inspects or
//! edits their visible-source annotations.

mod commands;
mod config;
mod error;
mod formatter;

use clap::Parser;
use config::Args;
use error::CliError;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ermodel=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (config, command) = args.into_config();
    tracing::debug!(store = %config.store_path.display(), format = %config.format, "configuration loaded");

    let formatter = formatter::create_formatter(config.format);
    match commands::execute(&config, &command, &*formatter) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            if let CliError::Invalid { report, .. } = &e {
                println!("{}", report);
            }
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
