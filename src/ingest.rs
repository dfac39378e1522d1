//! Spreadsheet Ingest
//!
//! Loads lab results exported from the upload sheet (CSV) into
//! [`SoilSample`]s, splits them into upload batches and builds reports in
//! parallel.
//!
//! Expected headers (case and spacing are ignored):
//! `Unique ID, State, LGA, Ward, Latitude, Longitude, Nitrogen, Phosporus,
//! Potassium, pH, Calcium, Magnesium, Iron, Manganese, Boron, Copper, Zinc,
//! CEC, Organic Matter, C/N, Texture, Source`
//!
//! Every column is read as text and readings go through
//! [`parse_reading`](crate::classify::parse_reading), so a cell such as
//! "10-30" is reported instead of silently becoming null or zero.

use crate::classify::{parse_reading, ClassifyError};
use crate::report::{FarmerInfo, ReportGenerator, SoilReport, SoilSample};
use crate::thresholds::SoilParameter;
use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Rows per upload batch
pub const BATCH_SIZE: usize = 50;

/// A data row that was not turned into a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub reason: String,
}

/// Outcome counts for one ingest run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub rows: usize,
    pub accepted: usize,
    pub batches: usize,
    pub batch_size: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Samples plus what happened while reading them
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub samples: Vec<SoilSample>,
    pub summary: IngestSummary,
}

/// Sheet column roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    UniqueId,
    State,
    Lga,
    Ward,
    Latitude,
    Longitude,
    Texture,
    Source,
    Reading(SoilParameter),
}

impl Field {
    fn from_header(header: &str) -> Option<Field> {
        let key: String = header
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();

        let field = match key.as_str() {
            "uniqueid" | "id" => Field::UniqueId,
            "state" => Field::State,
            "lga" => Field::Lga,
            "ward" => Field::Ward,
            "latitude" | "lat" => Field::Latitude,
            "longitude" | "lon" | "lng" => Field::Longitude,
            "texture" => Field::Texture,
            "source" => Field::Source,
            _ => return SoilParameter::from_alias(header).map(Field::Reading),
        };
        Some(field)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load samples from a CSV file on disk
pub fn load_samples_csv(path: &Path) -> Result<IngestResult> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to parse CSV: {:?}", path))?;

    tracing::info!("Read {} rows from {:?}", df.height(), path);
    samples_from_dataframe(&df)
}

/// Load samples from CSV bytes (e.g. an upload body)
pub fn parse_samples_csv(bytes: &[u8]) -> Result<IngestResult> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .context("Failed to parse CSV upload")?;

    tracing::info!("Read {} rows from upload", df.height());
    samples_from_dataframe(&df)
}

/// Map sheet rows to samples.
///
/// Rows without a Unique ID, or with a reading that is not a plain number,
/// are skipped and listed in the summary. Empty reading cells mean
/// "not measured".
pub fn samples_from_dataframe(df: &DataFrame) -> Result<IngestResult> {
    let mut columns: Vec<(Field, StringChunked)> = Vec::new();
    for name in df.get_column_names() {
        let name = name.to_string();
        let Some(field) = Field::from_header(&name) else {
            tracing::debug!("Ignoring unrecognised column '{}'", name);
            continue;
        };
        let series = df
            .column(&name)?
            .as_materialized_series()
            .cast(&DataType::String)
            .with_context(|| format!("Column '{}' cannot be read as text", name))?;
        columns.push((field, series.str()?.clone()));
    }

    if !columns.iter().any(|(f, _)| *f == Field::UniqueId) {
        return Err(anyhow!(
            "Missing required column 'Unique ID'. Available columns: {:?}",
            df.get_column_names()
        ));
    }

    let rows = df.height();
    let mut samples = Vec::with_capacity(rows);
    let mut skipped = Vec::new();

    for idx in 0..rows {
        match sample_from_row(&columns, idx) {
            Ok(sample) => samples.push(sample),
            Err(reason) => {
                tracing::warn!("Skipping row {}: {}", idx + 1, reason);
                skipped.push(SkippedRow { row: idx + 1, reason });
            }
        }
    }

    let summary = IngestSummary {
        rows,
        accepted: samples.len(),
        batches: samples.len().div_ceil(BATCH_SIZE),
        batch_size: BATCH_SIZE,
        skipped,
    };
    tracing::info!(
        "Ingested {} of {} rows into {} batches ({} skipped)",
        summary.accepted,
        summary.rows,
        summary.batches,
        summary.skipped.len()
    );

    Ok(IngestResult { samples, summary })
}

fn sample_from_row(columns: &[(Field, StringChunked)], idx: usize) -> Result<SoilSample, String> {
    let mut farmer = FarmerInfo::default();
    let mut sample = SoilSample::default();

    for (field, values) in columns {
        let Some(cell) = values.get(idx).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };

        match field {
            Field::UniqueId => farmer.unique_id = cell.to_string(),
            Field::State => farmer.state = Some(cell.to_string()),
            Field::Lga => farmer.lga = Some(cell.to_string()),
            Field::Ward => farmer.ward = Some(cell.to_string()),
            Field::Latitude => farmer.latitude = parse_coordinate(cell, 90.0),
            Field::Longitude => farmer.longitude = parse_coordinate(cell, 180.0),
            Field::Texture => sample.texture = Some(cell.to_string()),
            Field::Source => sample.source = Some(cell.to_string()),
            Field::Reading(parameter) => {
                let value = parse_reading(cell).map_err(|e| match e {
                    ClassifyError::InvalidReading(_) | ClassifyError::NonFiniteValue(_) => {
                        format!("invalid {} reading '{}'", parameter, cell)
                    }
                    other => format!("{} reading: {}", parameter, other),
                })?;
                sample.readings.insert(*parameter, value);
            }
        }
    }

    if farmer.unique_id.is_empty() {
        return Err("missing Unique ID".to_string());
    }
    sample.farmer = farmer;
    Ok(sample)
}

/// Coordinates outside the valid range are dropped rather than rejected
fn parse_coordinate(cell: &str, limit: f64) -> Option<f64> {
    parse_reading(cell).ok().filter(|v| v.abs() <= limit)
}

// ============================================================================
// Batching and report building
// ============================================================================

/// Split samples into upload batches of at most `size` (minimum 1)
pub fn batches(samples: &[SoilSample], size: usize) -> std::slice::Chunks<'_, SoilSample> {
    samples.chunks(size.max(1))
}

/// Build one report per sample in parallel, keeping input order.
///
/// Fails on the first sample that cannot be classified.
pub fn build_reports(samples: &[SoilSample], generator: &ReportGenerator) -> Result<Vec<SoilReport>> {
    samples
        .par_iter()
        .map(|sample| generator.generate(sample))
        .collect()
}
