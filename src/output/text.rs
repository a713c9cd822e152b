//! Plain-text report

use crate::analysis::AnalysisReport;
use std::fmt::Write;

/// Render the report as plain text: one block per model, then one block per
/// route file.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    for model in report.models() {
        let fields: Vec<String> = model
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.field_type))
            .collect();
        let _ = writeln!(out, "Model: {}", model.qualified_name);
        let _ = writeln!(out, "  Fields: [{}]", fields.join(", "));
        let _ = writeln!(out, "  Methods: [{}]", model.methods.join(", "));
    }

    for file in &report.routes {
        let _ = writeln!(out, "File: {}", file.path.display());
        for route in &file.patterns {
            let _ = writeln!(
                out,
                "  Pattern: {} -> {}",
                route.pattern,
                route.view.as_deref().unwrap_or("N/A")
            );
            if let Some(name) = &route.name {
                let _ = writeln!(out, "    Name: {}", name);
            }
        }
    }

    out
}
