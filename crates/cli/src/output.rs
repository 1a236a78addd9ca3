use crate::error::CliError;
use engine_core::report::RunReport;
use serde::Serialize;
use std::path::Path;

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub async fn write_report(report: &RunReport, path: &Path) -> Result<(), CliError> {
    tokio::fs::write(path, to_json(report)?).await?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", to_json(value)?);
    Ok(())
}

/// Writes `content` to `path`, or stdout when no path is given.
pub async fn emit(content: &str, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => tokio::fs::write(path, content).await?,
        None => println!("{content}"),
    }
    Ok(())
}

/// One line per mapping, for humans.
pub fn print_summary(report: &RunReport) {
    for mapping in &report.mappings {
        let cursor = mapping.final_cursor.to_string();
        println!(
            "{:<32} -> {:<24} {:<9} rows={:<10} cursor={}{}",
            mapping.source_table,
            mapping.target_collection,
            mapping.status.as_str(),
            mapping.rows_copied,
            if cursor.is_empty() { "-" } else { cursor.as_str() },
            mapping
                .error
                .as_deref()
                .map(|e| format!("  error: {e}"))
                .unwrap_or_default()
        );
    }
    println!(
        "Total rows: {} in {} ms",
        report.total_rows,
        report.duration_ms()
    );
}
