//! Terminal rendering for diagnostics

use crate::{Diagnostic, Severity};
use colored::Colorize;

/// Render a diagnostic for a terminal, one line per related note
pub fn render_diagnostic(diag: &Diagnostic) -> String {
    let label = match diag.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    };

    let mut out = format!(
        "{}[{}]: {}",
        label,
        diag.code.to_string().bold(),
        diag.message
    );
    if let Some(help) = &diag.help {
        out.push_str(&format!("\n  {} {}", "help:".cyan(), help));
    }
    if let Some(info) = diag.code.info().help {
        if diag.help.as_deref() != Some(info) {
            out.push_str(&format!("\n  {} {}", "note:".cyan(), info));
        }
    }
    for related in &diag.related {
        out.push_str(&format!("\n  {} {}", "-->".dimmed(), related.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeasureError;

    #[test]
    fn test_render_plain() {
        colored::control::set_override(false);
        let diag = MeasureError::sde_usage_missing().to_diagnostic();
        let rendered = render_diagnostic(&diag);
        assert!(rendered.starts_with("error[MSR0008]: SupplementalDataComponent"));
        assert!(rendered.contains("note: Add the 'supplemental-data' code"));
    }
}
