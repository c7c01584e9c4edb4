use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use schemac_core::{DataType, ErrorObject};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Outcome of validating one data file.
#[derive(Serialize, Debug)]
pub struct FileReport {
    pub file: String,
    pub valid: bool,
    pub errors: Vec<ErrorObject>,
}

#[derive(Serialize)]
struct KeywordGroupOutput<'a> {
    group: &'a str,
    keywords: &'a [String],
}

pub fn print_reports(reports: &[FileReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for report in reports {
                println!(
                    "{}",
                    serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FILE", "DATA PATH", "KEYWORD", "MESSAGE"]);
            for report in reports {
                if report.valid {
                    table.add_row(vec![report.file.as_str(), "", "", "valid"]);
                }
                for error in &report.errors {
                    table.add_row(vec![
                        report.file.as_str(),
                        data_path(error),
                        error.keyword.as_str(),
                        error.message.as_str(),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for report in reports {
                if report.valid {
                    println!("{}: valid", report.file);
                    continue;
                }
                println!("{}: invalid", report.file);
                for error in &report.errors {
                    println!(
                        "  {} {} ({})",
                        data_path(error),
                        error.message,
                        error.schema_path
                    );
                }
            }
        }
    }
}

pub fn print_keyword_groups(groups: &[(Option<DataType>, Vec<String>)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (applies_to, keywords) in groups {
                let out = KeywordGroupOutput {
                    group: group_name(*applies_to),
                    keywords,
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["GROUP", "KEYWORDS"]);
            for (applies_to, keywords) in groups {
                table.add_row(vec![group_name(*applies_to).to_string(), keywords.join(", ")]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (applies_to, keywords) in groups {
                println!("{}: {}", group_name(*applies_to), keywords.join(" "));
            }
        }
    }
}

fn group_name(applies_to: Option<DataType>) -> &'static str {
    applies_to.map_or("any", DataType::as_str)
}

fn data_path(error: &ErrorObject) -> &str {
    if error.data_path.is_empty() {
        "/"
    } else {
        &error.data_path
    }
}
