//! Allergy check CLI.

use std::io::{self, IsTerminal};

use clap::Parser;

use allergy_check::config::{self, DataPaths};
use allergy_check::logging::{init_logging, LogConfig, LogFormat};

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg};

fn main() {
    let cli = Cli::parse();

    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let log_config = LogConfig::default()
        .with_format(format)
        .with_ansi(io::stderr().is_terminal());
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let paths = cli
        .data_dir
        .clone()
        .map(DataPaths::new)
        .unwrap_or_default();

    let result = match &cli.command {
        Command::Check(args) => commands::run_check(&paths, args),
        Command::BuildDb(args) => commands::run_build_db(&paths, args).map(|()| 0),
        Command::ImportList(args) => commands::run_import_list(&paths, args).map(|()| 0),
        Command::ExportList => commands::run_export_list(&paths).map(|()| 0),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}
