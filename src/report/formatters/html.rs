use crate::report::types::SoilReport;

/// HTML formatter for soil reports
///
/// Produces a standalone, print-ready page; printing it to PDF from a browser
/// gives the downloadable report.
pub struct HtmlFormatter;

impl HtmlFormatter {
    /// Format report as standalone HTML with embedded CSS
    pub fn format(report: &SoilReport) -> String {
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "<title>Soil Analysis Report - {}</title>\n",
            escape(&report.farmer.unique_id)
        ));
        html.push_str("<style>\n");
        html.push_str("body { font-family: system-ui, sans-serif; max-width: 900px; margin: 40px auto; padding: 20px; line-height: 1.6; }\n");
        html.push_str("h1 { color: #2c3e50; margin-bottom: 10px; }\n");
        html.push_str("h2 { color: #34495e; border-bottom: 2px solid #ecf0f1; padding-bottom: 5px; margin-top: 30px; }\n");
        html.push_str(".meta { color: #6c757d; }\n");
        html.push_str("table { width: 100%; border-collapse: collapse; margin: 16px 0; }\n");
        html.push_str("th { background: #2f855a; color: white; text-align: left; padding: 10px; font-weight: 600; }\n");
        html.push_str("td { padding: 10px; border-bottom: 1px solid #ecf0f1; }\n");
        html.push_str(".band { padding: 2px 10px; border-radius: 9999px; font-size: 0.9em; font-weight: 500; }\n");
        html.push_str(".band-very-low { background: #fee2e2; color: #991b1b; }\n");
        html.push_str(".band-adequate { background: #dcfce7; color: #166534; }\n");
        html.push_str(".band-high { background: #dbeafe; color: #1e40af; }\n");
        html.push_str(".band-none { background: #f3f4f6; color: #374151; }\n");
        html.push_str("@media print { body { margin: 0; max-width: none; } }\n");
        html.push_str("</style>\n</head>\n<body>\n");

        html.push_str("<h1>Soil Analysis Report</h1>\n");
        html.push_str(&format!(
            "<p class=\"meta\">Generated {}</p>\n",
            escape(&report.generated_at)
        ));

        // Sample information
        let farmer = &report.farmer;
        html.push_str("<h2>Sample Information</h2>\n<table>\n");
        push_info_row(&mut html, "Unique ID", Some(&farmer.unique_id));
        push_info_row(&mut html, "State", farmer.state.as_deref());
        push_info_row(&mut html, "LGA", farmer.lga.as_deref());
        push_info_row(&mut html, "Ward", farmer.ward.as_deref());
        if let (Some(lat), Some(lon)) = (farmer.latitude, farmer.longitude) {
            push_info_row(&mut html, "Location", Some(&format!("{:.5}, {:.5}", lat, lon)));
        }
        push_info_row(&mut html, "Texture", report.texture.as_deref());
        push_info_row(&mut html, "Source", report.source.as_deref());
        html.push_str("</table>\n");

        // Results
        html.push_str("<h2>Results</h2>\n<table>\n<tr><th>Parameter</th><th>Unit</th><th>Result</th>");
        for crop in &report.crops {
            html.push_str(&format!("<th>{} Range</th><th>{} Status</th>", crop, crop));
        }
        html.push_str("</tr>\n");

        for entry in &report.entries {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>",
                escape(entry.parameter.name()),
                escape(&entry.unit),
                entry.value_display()
            ));
            for assessment in &entry.assessments {
                let class = assessment.band.map(|b| b.css_class()).unwrap_or("band-none");
                html.push_str(&format!(
                    "<td>{}</td><td><span class=\"band {}\">{}</span></td>",
                    escape(&assessment.range_display),
                    class,
                    assessment.band_label()
                ));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");

        // Summary
        html.push_str("<h2>Summary</h2>\n<ul>\n");
        for summary in &report.summaries {
            let crop = summary.crop.map(|c| c.name()).unwrap_or("All crops");
            html.push_str(&format!(
                "<li><strong>{}:</strong> {} adequate, {} very low, {} high</li>\n",
                crop, summary.adequate, summary.very_low, summary.high
            ));
        }
        html.push_str("</ul>\n</body>\n</html>\n");

        html
    }
}

fn push_info_row(html: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value {
        html.push_str(&format!(
            "<tr><td><strong>{}</strong></td><td>{}</td></tr>\n",
            label,
            escape(v)
        ));
    }
}

/// Escape text for HTML element content and attribute values
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportGenerator, SoilSample};
    use crate::thresholds::SoilParameter;

    #[test]
    fn test_format_html() {
        let mut sample = SoilSample::new("NG-KD-0007")
            .with_reading(SoilParameter::Ph, 6.7)
            .with_reading(SoilParameter::Calcium, 1200.0)
            .with_reading(SoilParameter::Iron, 90.0);
        sample.farmer.state = Some("Kaduna".to_string());

        let report = ReportGenerator::new().generate(&sample).unwrap();
        let html = HtmlFormatter::format(&report);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Soil Analysis Report - NG-KD-0007</title>"));
        assert!(html.contains("<span class=\"band band-adequate\">Adequate</span>"));
        assert!(html.contains("<span class=\"band band-high\">High</span>"));
        assert!(html.contains("<span class=\"band band-very-low\">Very Low</span>"));
        assert!(html.contains("<span class=\"band band-none\">Not measured</span>"));
        assert!(html.contains("<td>Kaduna</td>"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut sample = SoilSample::new("<script>alert(1)</script>");
        sample.source = Some("Lab \"A\" & Sons".to_string());

        let report = ReportGenerator::new().generate(&sample).unwrap();
        let html = HtmlFormatter::format(&report);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Lab &quot;A&quot; &amp; Sons"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape("plain"), "plain");
    }
}
