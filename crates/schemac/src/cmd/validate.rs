use std::path::Path;

use schemac_core::{Options, SchemaCompiler};
use schemac_store::SchemaStore;
use serde_json::Value;
use tracing::{debug, info};

use crate::cmd::ValidateArgs;
use crate::exit::{
    io_error, schema_error, store_error, CliError, CliResult, DATA_INVALID, SCHEMA_ERROR, SUCCESS,
};
use crate::output::{print_reports, FileReport, OutputFormat};

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let mut compiler = SchemaCompiler::new(Options {
        all_errors: args.all_errors,
        data: args.data_refs,
        strict_keywords: args.strict_keywords,
        ..Options::default()
    });

    if let Some(dir) = &args.refs {
        let store =
            SchemaStore::from_directory(dir).map_err(|err| store_error("schema load failed", err))?;
        let keys = store
            .install(&mut compiler)
            .map_err(|err| store_error("schema load failed", err))?;
        debug!(count = keys.len(), dir = %dir.display(), "referenced schemas installed");
    }

    let schema = read_json(&args.schema, SCHEMA_ERROR)?;
    let validator = compiler
        .compile(&schema)
        .map_err(|err| schema_error("schema compile failed", err))?;

    let mut reports = Vec::with_capacity(args.data.len());
    for path in &args.data {
        let data = read_json(path, DATA_INVALID)?;
        let errors = match validator.validate(&data) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.into_errors(),
        };
        info!(file = %path.display(), errors = errors.len(), "validated");
        reports.push(FileReport {
            file: path.display().to_string(),
            valid: errors.is_empty(),
            errors,
        });
    }

    print_reports(&reports, format);
    if reports.iter().all(|report| report.valid) {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

/// Parse a JSON file; unparsable content exits with `invalid_code`.
fn read_json(path: &Path, invalid_code: i32) -> CliResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|err| io_error(path, err))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            invalid_code,
            format!("{}: invalid JSON: {err}", path.display()),
        )
    })
}
