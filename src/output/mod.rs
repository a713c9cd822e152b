// Output module for rendering analysis reports

mod text;

pub use text::render_text;

use crate::analysis::AnalysisReport;
use crate::config::OutputFormat;
use crate::error::Result;

/// Render the full report as pretty-printed JSON
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the report in the requested format
pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
    }
}
