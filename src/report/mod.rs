//! Soil Report Module
//!
//! Turns a lab sample into a banded soil analysis report and renders it.
//!
//! ## Layout
//! - `types`: samples, report rows, per-crop assessments and summaries
//! - `generator`: builds a report from a sample against the threshold table
//! - `formatters`: markdown, HTML (print-ready) and JSON renderings

pub mod types;
pub mod generator;
pub mod formatters;

pub use types::{BandSummary, CropAssessment, FarmerInfo, ReportEntry, SoilReport, SoilSample};
pub use generator::ReportGenerator;
pub use formatters::{HtmlFormatter, JsonFormatter, MarkdownFormatter, ReportFormat};

/// Render a report in the requested format
pub fn render(report: &SoilReport, format: ReportFormat) -> anyhow::Result<String> {
    let body = match format {
        ReportFormat::Json => JsonFormatter::format(report)?,
        ReportFormat::Markdown => MarkdownFormatter::format(report),
        ReportFormat::Html => HtmlFormatter::format(report),
    };
    Ok(body)
}
