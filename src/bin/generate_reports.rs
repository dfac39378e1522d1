//! Generate Soil Reports
//!
//! Reads a lab results sheet (CSV) and writes one report per sample.
//! Run with: cargo run --features cli --bin generate_reports -- <samples.csv> <out_dir> [markdown|html|json]

use anyhow::{bail, Context, Result};
use soil_report_rust::ingest::{batches, build_reports, load_samples_csv, BATCH_SIZE};
use soil_report_rust::report::render;
use soil_report_rust::{ReportFormat, ReportGenerator};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: generate_reports <samples.csv> <out_dir> [markdown|html|json]";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soil_report_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, out_dir, format) = match args.as_slice() {
        [input, out_dir] => (PathBuf::from(input), PathBuf::from(out_dir), ReportFormat::Markdown),
        [input, out_dir, format] => {
            let Some(format) = ReportFormat::from_name(format) else {
                bail!("Unknown format '{}'\n{}", format, USAGE);
            };
            (PathBuf::from(input), PathBuf::from(out_dir), format)
        }
        _ => bail!(USAGE),
    };

    let start = Instant::now();
    let result = load_samples_csv(&input)?;

    for skipped in &result.summary.skipped {
        println!("  skipped row {}: {}", skipped.row, skipped.reason);
    }

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let generator = ReportGenerator::new();
    let mut written = 0;
    for (idx, batch) in batches(&result.samples, BATCH_SIZE).enumerate() {
        let reports = build_reports(batch, &generator)?;
        for report in &reports {
            let body = render(report, format)?;
            let path = report_path(&out_dir, &report.farmer.unique_id, format);
            fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?;
            written += 1;
        }
        tracing::info!("Batch {}: {} reports written", idx + 1, reports.len());
    }

    println!("\n{}", "=".repeat(60));
    println!("Rows read:       {}", result.summary.rows);
    println!("Reports written: {}", written);
    println!("Rows skipped:    {}", result.summary.skipped.len());
    println!("Output:          {:?}", out_dir);
    println!("Elapsed:         {:.2?}", start.elapsed());

    Ok(())
}

/// File name from the Unique ID, with path-unsafe characters replaced
fn report_path(out_dir: &Path, unique_id: &str, format: ReportFormat) -> PathBuf {
    let stem: String = unique_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    out_dir.join(format!("{}.{}", stem, format.extension()))
}
