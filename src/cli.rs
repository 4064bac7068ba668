//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "allergy-check",
    version,
    about = "Check a drug against your allergy list",
    long_about = "Check a drug name, ingredient or license number against a personal allergy\n\
                  list and cross-reactive drug groups.\n\n\
                  A clear result is only reported as verified when the license number\n\
                  resolved to its active ingredients."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Data directory holding data.json, the license table and the stored list
    /// (default: ~/.allergy-check).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a drug name/ingredient and/or license number.
    Check(CheckArgs),

    /// Build the license table from the regulator's CSV exports.
    BuildDb(BuildDbArgs),

    /// Replace the stored allergy list with an imported JSON array.
    ImportList(ImportListArgs),

    /// Print the current allergy list as a JSON array.
    ExportList,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Drug name or ingredients, free text.
    #[arg(long, short = 't', default_value = "")]
    pub text: String,

    /// License number (e.g. 衛署藥製字第012345號, or just the digits).
    #[arg(long, short = 'l', default_value = "")]
    pub license: String,

    /// License table location: a file path or an http(s) URL.
    #[arg(long = "license-db", value_name = "PATH|URL")]
    pub license_db: Option<String>,

    /// Cache-busting version appended to an http license table URL.
    #[arg(long = "db-version", value_name = "VERSION")]
    pub db_version: Option<String>,

    /// Do not wait for the license table; an unfinished load is unverified.
    #[arg(long = "no-wait")]
    pub no_wait: bool,

    /// Print the full evaluation as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct BuildDbArgs {
    /// Ingredient export (one row per license and ingredient).
    #[arg(long, value_name = "CSV")]
    pub ingredients: PathBuf,

    /// Optional product export supplying Chinese product names.
    #[arg(long, value_name = "CSV")]
    pub names: Option<PathBuf>,

    /// Output path (default: <data-dir>/db/license_to_actives.json).
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ImportListArgs {
    /// JSON array of { type, value, note } objects.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
