//! Output formatting utilities

use anyhow::{Context, Result};
use colored::*;
use octofhir_measure_diagnostics::{MeasureError, render_diagnostic};
use octofhir_measure_eval::{GroupResult, MeasureResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tabled::{Table, Tabled, settings::Style};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "table" => Self::Table,
            _ => Self::JsonPretty,
        }
    }
}

/// Set up color output based on user preference; `auto` leaves detection to `colored`
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::unset_override(),
    }
}

/// Format an error for display, rendering measure diagnostics with their code
pub fn format_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<MeasureError>() {
        Some(measure_error) => {
            let mut out = render_diagnostic(&measure_error.to_diagnostic());
            for context in error
                .chain()
                .take_while(|e| e.downcast_ref::<MeasureError>().is_none())
            {
                out.push_str(&format!("\n  {} {}", "while:".dimmed(), context));
            }
            out
        }
        None => format!("{} {:#}", "Error:".red().bold(), error),
    }
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Render a measure result in the requested format
pub fn format_result(result: &MeasureResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(result).context("Failed to serialize result"),
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(result).context("Failed to serialize result")
        }
        OutputFormat::Table => Ok(format_as_table(result)),
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Stratum")]
    stratum: String,
    #[tabled(rename = "Population")]
    population: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Aggregate")]
    aggregate: String,
    #[tabled(rename = "Score")]
    score: String,
}

/// Summary table: one row per population, for groups and every stratum
pub fn format_as_table(result: &MeasureResult) -> String {
    let mut rows = Vec::new();
    for group in &result.groups {
        push_group_rows(&mut rows, group);
    }
    let mut table = Table::new(rows).with(Style::modern()).to_string();
    for error in &result.errors {
        table.push('\n');
        table.push_str(&format!("{}: {}", error.group_id.bold(), render_diagnostic(&error.diagnostic)));
    }
    table
}

fn push_group_rows(rows: &mut Vec<Row>, group: &GroupResult) {
    let score = format_score(group.score);
    for population in &group.populations {
        rows.push(Row {
            group: group.id.clone(),
            stratum: String::new(),
            population: population.id.clone(),
            count: population.count,
            aggregate: population
                .aggregation_result
                .map(|d| d.to_string())
                .unwrap_or_default(),
            score: score.clone(),
        });
    }
    for stratifier in &group.stratifiers {
        for stratum in &stratifier.strata {
            let label = match &stratum.value {
                Some(value) => format!("{}={}", stratifier.id, value),
                None if stratum.components.is_empty() => stratifier.id.clone(),
                None => stratum
                    .components
                    .iter()
                    .map(|c| format!("{}={}", c.id, c.value))
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            let score = format_score(stratum.score);
            for population in &stratum.populations {
                rows.push(Row {
                    group: group.id.clone(),
                    stratum: label.clone(),
                    population: population.id.clone(),
                    count: population.count,
                    aggregate: population
                        .aggregation_result
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    score: score.clone(),
                });
            }
        }
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}
