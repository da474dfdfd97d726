//! Validate command implementation

use super::output;
use anyhow::{Context, Result};
use colored::*;
use octofhir_measure_def::MeasureDefBuilder;
use octofhir_measure_diagnostics::render_diagnostic;
use std::fs;
use std::path::PathBuf;

/// Configuration for validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
}

/// Build each measure file and report its definition errors
pub fn validate(config: ValidateConfig) -> Result<()> {
    if config.files.is_empty() {
        anyhow::bail!("No files specified for validation");
    }

    let builder = MeasureDefBuilder::new();
    let mut failed = 0;

    for file in &config.files {
        let json = fs::read_to_string(file)
            .with_context(|| format!("Failed to read measure file: {}", file.display()))?;
        match builder.build_from_json(&json) {
            Ok(def) => {
                let stratifiers: usize = def.groups.iter().map(|g| g.stratifiers.len()).sum();
                println!(
                    "{} {} ({} group(s), {} stratifier(s), {} sde(s))",
                    "✓".green().bold(),
                    file.display(),
                    def.groups.len(),
                    stratifiers,
                    def.sdes.len()
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {}", "✗".red().bold(), file.display());
                println!("  {}", render_diagnostic(&e.to_diagnostic()));
            }
        }
    }

    println!();
    if failed == 0 {
        println!(
            "{}",
            output::format_success(&format!("{} measure(s) valid", config.files.len()))
        );
        Ok(())
    } else {
        anyhow::bail!("{} of {} measure(s) invalid", failed, config.files.len())
    }
}
