//! Band Classification
//!
//! Maps a measured soil value onto a qualitative band against an inclusive
//! `[lower, upper]` range:
//!
//! | Reading              | Band      |
//! |----------------------|-----------|
//! | value < lower        | Very Low  |
//! | lower ≤ value ≤ upper| Adequate  |
//! | value > upper        | High      |
//!
//! Bad input never falls through to "Adequate": non-finite readings, NaN
//! bounds and inverted ranges are errors.

use crate::thresholds::Threshold;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Qualitative band for a soil reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Very Low")]
    VeryLow,
    Adequate,
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::VeryLow, Band::Adequate, Band::High];

    /// Label as printed on reports
    pub fn label(&self) -> &'static str {
        match self {
            Band::VeryLow => "Very Low",
            Band::Adequate => "Adequate",
            Band::High => "High",
        }
    }

    /// CSS class used by the HTML report
    pub fn css_class(&self) -> &'static str {
        match self {
            Band::VeryLow => "band-very-low",
            Band::Adequate => "band-adequate",
            Band::High => "band-high",
        }
    }

    /// Parse a printed label ("very low", "Adequate", "HIGH")
    pub fn from_label(label: &str) -> Option<Band> {
        match label.trim().to_lowercase().as_str() {
            "very low" | "verylow" | "very_low" => Some(Band::VeryLow),
            "adequate" => Some(Band::Adequate),
            "high" => Some(Band::High),
            _ => None,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("reading is missing")]
    MissingValue,

    #[error("reading {0:?} is not a number")]
    InvalidReading(String),

    #[error("reading {0} is not a finite number")]
    NonFiniteValue(f64),

    #[error("range bound is not a number")]
    InvalidBound,

    #[error("lower bound {lower} is greater than upper bound {upper}")]
    InvertedRange { lower: f64, upper: f64 },

    #[error("cannot parse range {0:?}")]
    MalformedRange(String),
}

/// Classify `value` against `[lower, upper]`.
///
/// Use `f64::INFINITY` as `upper` for floor-only parameters.
///
/// # Examples
/// ```
/// use soil_report_rust::{classify, Band};
///
/// assert_eq!(classify(6.5, [6.0, 7.0]).unwrap(), Band::Adequate);
/// assert_eq!(classify(29.0, [30.0, 80.0]).unwrap(), Band::VeryLow);
/// assert_eq!(classify(1000.0, [0.9, f64::INFINITY]).unwrap(), Band::Adequate);
/// assert!(classify(50.0, [80.0, 30.0]).is_err());
/// ```
pub fn classify(value: f64, range: [f64; 2]) -> Result<Band, ClassifyError> {
    let [lower, upper] = range;
    let threshold = Threshold::new(lower, upper)?;
    classify_threshold(value, &threshold)
}

/// Classify `value` against an already validated range
pub fn classify_threshold(value: f64, threshold: &Threshold) -> Result<Band, ClassifyError> {
    if !value.is_finite() {
        return Err(ClassifyError::NonFiniteValue(value));
    }

    let band = if value < threshold.lower() {
        Band::VeryLow
    } else if value > threshold.upper() {
        Band::High
    } else {
        Band::Adequate
    };
    Ok(band)
}

/// Parse a raw reading ("6.7", " 85 ", "-0.5") into a number.
///
/// Only plain decimal numbers are accepted. Arithmetic such as "2+3" is
/// rejected rather than evaluated.
pub fn parse_reading(text: &str) -> Result<f64, ClassifyError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClassifyError::MissingValue);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| ClassifyError::InvalidReading(trimmed.to_string()))?;

    if !value.is_finite() {
        return Err(ClassifyError::NonFiniteValue(value));
    }
    Ok(value)
}

/// Parse and classify raw reading text against a range
pub fn classify_reading(text: &str, threshold: &Threshold) -> Result<Band, ClassifyError> {
    let value = parse_reading(text)?;
    classify_threshold(value, threshold)
}

/// Classify an optional reading; a missing reading is an error, never zero
pub fn classify_optional(value: Option<f64>, threshold: &Threshold) -> Result<Band, ClassifyError> {
    match value {
        Some(v) => classify_threshold(v, threshold),
        None => Err(ClassifyError::MissingValue),
    }
}
