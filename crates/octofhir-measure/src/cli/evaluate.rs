//! Evaluate command implementation

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::*;
use octofhir_measure_def::MeasureDefBuilder;
use octofhir_measure_diagnostics::render_diagnostic;
use octofhir_measure_eval::{
    ErrorPolicy, MeasureEvaluationOptions, MeasureEvaluator, MeasureResult, SubjectResults,
};
use std::fs;
use std::path::PathBuf;

/// Configuration for evaluate command
pub struct EvaluateConfig {
    /// FHIR Measure resource (JSON)
    pub measure: PathBuf,
    /// Per-subject expression results (JSON)
    pub results: PathBuf,
    /// Evaluation options file (JSON)
    pub options: Option<PathBuf>,
    pub no_set_membership: bool,
    pub collect_errors: bool,
    pub subject_type: Option<String>,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

/// Evaluate a measure against precomputed subject results
pub fn evaluate(config: EvaluateConfig) -> Result<()> {
    let result = run(&config)?;

    for error in &result.errors {
        eprintln!(
            "{} group {} ({}):\n{}",
            "Skipped".yellow().bold(),
            error.group_index + 1,
            error.group_id,
            render_diagnostic(&error.diagnostic)
        );
    }

    let format = config
        .output_format
        .as_deref()
        .map(OutputFormat::parse)
        .unwrap_or(OutputFormat::JsonPretty);
    let content = output::format_result(&result, format)?;
    output::write_output(&content, config.output_file.as_deref())
}

/// Load inputs, build the definition and score it
pub fn run(config: &EvaluateConfig) -> Result<MeasureResult> {
    let measure_json = fs::read_to_string(&config.measure)
        .with_context(|| format!("Failed to read measure file: {}", config.measure.display()))?;
    let def = MeasureDefBuilder::new()
        .build_from_json(&measure_json)
        .with_context(|| format!("Failed to build measure: {}", config.measure.display()))?;
    log::info!(
        "Loaded measure {} with {} group(s)",
        def.display_url(),
        def.groups.len()
    );

    let results_json = fs::read_to_string(&config.results)
        .with_context(|| format!("Failed to read results file: {}", config.results.display()))?;
    let results = SubjectResults::from_json(&results_json)
        .with_context(|| format!("Failed to load results: {}", config.results.display()))?;
    log::info!("Loaded results for {} subject(s)", results.len());

    let options = load_options(config)?;
    log::debug!("Evaluation options: {:?}", options);

    Ok(MeasureEvaluator::new(options).evaluate(&def, &results)?)
}

/// Options file first, then command-line overrides
fn load_options(config: &EvaluateConfig) -> Result<MeasureEvaluationOptions> {
    let mut options = match &config.options {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file: {}", path.display()))?;
            MeasureEvaluationOptions::from_json(&json)
                .with_context(|| format!("Failed to load options: {}", path.display()))?
        }
        None => MeasureEvaluationOptions::default(),
    };

    if config.no_set_membership {
        options = options.with_set_membership(false);
    }
    if config.collect_errors {
        options = options.with_error_policy(ErrorPolicy::Collect);
    }
    if let Some(subject_type) = &config.subject_type {
        options = options.with_subject_type(subject_type.clone());
    }
    Ok(options)
}
