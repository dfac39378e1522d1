use crate::report::types::{ReportEntry, SoilReport};

/// Markdown formatter for soil reports
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format report as markdown
    pub fn format(report: &SoilReport) -> String {
        let mut md = String::with_capacity(2048);

        md.push_str("# Soil Analysis Report\n\n");
        md.push_str(&format!("*Generated:* {}\n\n", report.generated_at));

        Self::format_farmer(&mut md, report);
        Self::format_results(&mut md, report);
        Self::format_summary(&mut md, report);

        md
    }

    fn format_farmer(md: &mut String, report: &SoilReport) {
        let farmer = &report.farmer;
        md.push_str("## Sample Information\n\n");
        md.push_str(&format!("- **Unique ID:** {}\n", escape(&farmer.unique_id)));

        let fields = [
            ("State", farmer.state.as_deref()),
            ("LGA", farmer.lga.as_deref()),
            ("Ward", farmer.ward.as_deref()),
            ("Texture", report.texture.as_deref()),
            ("Source", report.source.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(v) = value {
                md.push_str(&format!("- **{}:** {}\n", label, escape(v)));
            }
        }

        if let (Some(lat), Some(lon)) = (farmer.latitude, farmer.longitude) {
            md.push_str(&format!("- **Location:** {:.5}, {:.5}\n", lat, lon));
        }
        md.push('\n');
    }

    fn format_results(md: &mut String, report: &SoilReport) {
        md.push_str("## Results\n\n");

        // Header: Parameter | Unit | Result | <crop> Range | <crop> Status ...
        md.push_str("| Parameter | Unit | Result |");
        for crop in &report.crops {
            md.push_str(&format!(" {} Range | {} Status |", crop, crop));
        }
        md.push('\n');

        md.push_str("|---|---|---|");
        for _ in &report.crops {
            md.push_str("---|---|");
        }
        md.push('\n');

        for entry in &report.entries {
            md.push_str(&Self::format_row(entry));
        }
        md.push('\n');
    }

    fn format_row(entry: &ReportEntry) -> String {
        let mut row = format!(
            "| {} | {} | {} |",
            entry.parameter,
            entry.unit,
            entry.value_display()
        );
        for assessment in &entry.assessments {
            let status = match assessment.band {
                Some(band) => format!("**{}**", band),
                None => "Not measured".to_string(),
            };
            row.push_str(&format!(" {} | {} |", assessment.range_display, status));
        }
        row.push('\n');
        row
    }

    fn format_summary(md: &mut String, report: &SoilReport) {
        md.push_str("## Summary\n\n");
        for summary in &report.summaries {
            let crop = summary.crop.map(|c| c.name()).unwrap_or("All crops");
            md.push_str(&format!(
                "- **{}:** {} adequate, {} very low, {} high ({} of {} parameters measured)\n",
                crop,
                summary.adequate,
                summary.very_low,
                summary.high,
                summary.measured(),
                summary.measured() + summary.not_measured
            ));
        }
    }
}

/// Backslash-escape markdown syntax in user-supplied text; newlines become spaces
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '|' | '[' | ']' | '<' | '>' | '#' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}
