use schemac_core::SchemaCompiler;

use crate::cmd::KeywordsArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_keyword_groups, OutputFormat};

pub fn run(args: KeywordsArgs, format: OutputFormat) -> CliResult<i32> {
    let compiler = SchemaCompiler::default();
    let mut groups = compiler.rules().group_keywords();

    if let Some(wanted) = &args.group {
        groups.retain(|(applies_to, _)| applies_to.map_or("any", |t| t.as_str()) == wanted.as_str());
        if groups.is_empty() {
            return Err(CliError::new(USAGE, format!("no keyword group named {wanted}")));
        }
    }

    print_keyword_groups(&groups, format);
    Ok(SUCCESS)
}
