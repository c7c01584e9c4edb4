use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod keywords;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate data files against a schema.
    Validate(ValidateArgs),
    /// List registered keywords by data type group.
    Keywords(KeywordsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Keywords(args) => keywords::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file to compile.
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,
    /// Directory of `*.schema.json` documents available to `$ref`.
    #[arg(long, value_name = "DIR")]
    pub refs: Option<PathBuf>,
    /// Report every violation instead of stopping at the first.
    #[arg(long)]
    pub all_errors: bool,
    /// Accept `{"$data": "<pointer>"}` keyword values.
    #[arg(long)]
    pub data_refs: bool,
    /// Fail compilation on unknown keywords.
    #[arg(long)]
    pub strict_keywords: bool,
    /// Data files to validate.
    #[arg(required = true, value_name = "DATA")]
    pub data: Vec<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct KeywordsArgs {
    /// Only list keywords of one group (`any`, `number`, `string`, ...).
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
