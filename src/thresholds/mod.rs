//! Crop Threshold Tables
//!
//! Single source of truth for the acceptable soil-test ranges used when
//! banding a reading. Every report, formatter and endpoint reads ranges from
//! here; nothing else hardcodes a threshold.
//!
//! Ranges are inclusive on both ends. Parameters that only have a floor
//! (Boron, Zinc for rice) carry an infinite upper bound.

pub mod range;

pub use range::parse_range;

use crate::classify::{Band, ClassifyError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Crops
// ============================================================================

/// Crops that the threshold table covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Rice,
    Maize,
}

impl Crop {
    pub const ALL: [Crop; 2] = [Crop::Rice, Crop::Maize];

    pub fn name(&self) -> &'static str {
        match self {
            Crop::Rice => "Rice",
            Crop::Maize => "Maize",
        }
    }

    /// Case-insensitive lookup ("rice", "MAIZE", "corn")
    pub fn from_name(name: &str) -> Option<Crop> {
        match name.trim().to_lowercase().as_str() {
            "rice" => Some(Crop::Rice),
            "maize" | "corn" => Some(Crop::Maize),
            _ => None,
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Soil parameters
// ============================================================================

/// Soil parameters reported by the lab, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoilParameter {
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "Available P")]
    AvailableP,
    #[serde(rename = "Exchangeable K")]
    ExchangeableK,
    Calcium,
    Magnesium,
    Iron,
    Manganese,
    Boron,
    Copper,
    Zinc,
    #[serde(rename = "CEC")]
    Cec,
    #[serde(rename = "Total Nitrogen")]
    TotalNitrogen,
    #[serde(rename = "Organic Matter")]
    OrganicMatter,
    #[serde(rename = "C/N")]
    CarbonNitrogenRatio,
}

impl SoilParameter {
    pub const ALL: [SoilParameter; 14] = [
        SoilParameter::Ph,
        SoilParameter::AvailableP,
        SoilParameter::ExchangeableK,
        SoilParameter::Calcium,
        SoilParameter::Magnesium,
        SoilParameter::Iron,
        SoilParameter::Manganese,
        SoilParameter::Boron,
        SoilParameter::Copper,
        SoilParameter::Zinc,
        SoilParameter::Cec,
        SoilParameter::TotalNitrogen,
        SoilParameter::OrganicMatter,
        SoilParameter::CarbonNitrogenRatio,
    ];

    /// Display name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            SoilParameter::Ph => "pH",
            SoilParameter::AvailableP => "Available P",
            SoilParameter::ExchangeableK => "Exchangeable K",
            SoilParameter::Calcium => "Calcium",
            SoilParameter::Magnesium => "Magnesium",
            SoilParameter::Iron => "Iron",
            SoilParameter::Manganese => "Manganese",
            SoilParameter::Boron => "Boron",
            SoilParameter::Copper => "Copper",
            SoilParameter::Zinc => "Zinc",
            SoilParameter::Cec => "CEC",
            SoilParameter::TotalNitrogen => "Total Nitrogen",
            SoilParameter::OrganicMatter => "Organic Matter",
            SoilParameter::CarbonNitrogenRatio => "C/N",
        }
    }

    /// Measurement unit ("" for pH)
    pub fn unit(&self) -> &'static str {
        match self {
            SoilParameter::Ph => "",
            SoilParameter::Cec => "meq/100g",
            SoilParameter::TotalNitrogen | SoilParameter::OrganicMatter => "%",
            SoilParameter::CarbonNitrogenRatio => "ratio",
            _ => "ppm",
        }
    }

    /// Spreadsheet header for this parameter in the lab upload sheet
    pub fn sheet_column(&self) -> &'static str {
        match self {
            SoilParameter::Ph => "pH",
            SoilParameter::AvailableP => "Phosporus",
            SoilParameter::ExchangeableK => "Potassium",
            SoilParameter::TotalNitrogen => "Nitrogen",
            other => other.name(),
        }
    }

    /// Resolve a parameter from a display name, sheet header or API key.
    ///
    /// Matching ignores case, whitespace, underscores and hyphens so that
    /// "Organic Matter", "organic_matter" and "organicMatter" all resolve.
    /// The lab sheet's "Phosporus" spelling is accepted alongside "Phosphorus".
    pub fn from_alias(alias: &str) -> Option<SoilParameter> {
        let key: String = alias
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect();

        let param = match key.as_str() {
            "ph" | "phlevel" | "ph(inwater)" | "phinwater" => SoilParameter::Ph,
            "availablep" | "phosphorus" | "phosporus" | "p" => SoilParameter::AvailableP,
            "exchangeablek" | "potassium" | "k" => SoilParameter::ExchangeableK,
            "calcium" | "ca" => SoilParameter::Calcium,
            "magnesium" | "mg" => SoilParameter::Magnesium,
            "iron" | "fe" => SoilParameter::Iron,
            "manganese" | "mn" => SoilParameter::Manganese,
            "boron" | "b" => SoilParameter::Boron,
            "copper" | "cu" => SoilParameter::Copper,
            "zinc" | "zn" => SoilParameter::Zinc,
            "cec" => SoilParameter::Cec,
            "totalnitrogen" | "nitrogen" | "n" => SoilParameter::TotalNitrogen,
            "organicmatter" | "om" => SoilParameter::OrganicMatter,
            "c/n" | "cn" | "cnratio" | "c:n" => SoilParameter::CarbonNitrogenRatio,
            _ => return None,
        };
        Some(param)
    }

    /// Acceptable range for this parameter on the given crop
    pub fn threshold(&self, crop: Crop) -> Threshold {
        threshold(*self, crop)
    }

    /// Range text as printed on the lab report (pH keeps one decimal)
    pub fn range_display(&self, crop: Crop) -> String {
        let decimals = match self {
            SoilParameter::Ph => Some(1),
            _ => None,
        };
        self.threshold(crop).display_with(decimals)
    }
}

impl fmt::Display for SoilParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Threshold
// ============================================================================

/// Inclusive acceptable range `[lower, upper]` for a soil reading.
///
/// Invariant: `lower <= upper` and neither bound is NaN. Either bound may be
/// infinite for one-sided ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ThresholdRepr", try_from = "ThresholdRepr")]
pub struct Threshold {
    lower: f64,
    upper: f64,
}

impl Threshold {
    /// Build a range, rejecting NaN bounds and inverted ranges
    pub fn new(lower: f64, upper: f64) -> Result<Self, ClassifyError> {
        if lower.is_nan() || upper.is_nan() {
            return Err(ClassifyError::InvalidBound);
        }
        if lower > upper {
            return Err(ClassifyError::InvertedRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Range with only a floor (`≥ lower`)
    pub fn at_least(lower: f64) -> Result<Self, ClassifyError> {
        Self::new(lower, f64::INFINITY)
    }

    /// Range with only a ceiling (`≤ upper`)
    pub fn at_most(upper: f64) -> Result<Self, ClassifyError> {
        Self::new(f64::NEG_INFINITY, upper)
    }

    /// Table constructor; table rows are checked by `table_rows_are_well_formed`.
    const fn table(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn has_upper_bound(&self) -> bool {
        self.upper.is_finite()
    }

    pub fn has_lower_bound(&self) -> bool {
        self.lower.is_finite()
    }

    /// Range from a JSON value: `{"lower": .., "upper": ..}` bounds (null for
    /// an open side) or range text such as "30-80"
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ClassifyError> {
        match value {
            serde_json::Value::String(text) => parse_range(text),
            serde_json::Value::Object(_) => {
                let repr = ThresholdRepr::deserialize(value)
                    .map_err(|e| ClassifyError::MalformedRange(format!("{} ({})", value, e)))?;
                Threshold::try_from(repr)
            }
            other => Err(ClassifyError::MalformedRange(other.to_string())),
        }
    }

    /// Band a reading against this range
    pub fn classify(&self, value: f64) -> Result<Band, ClassifyError> {
        crate::classify::classify_threshold(value, self)
    }

    /// Display form used in reports: "30-80", "≥0.9", "≤1.2"
    pub fn display(&self) -> String {
        self.display_with(None)
    }

    /// Display with a fixed number of decimals ("6.0-7.0")
    pub fn display_with(&self, decimals: Option<usize>) -> String {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (true, true) => format!(
                "{}-{}",
                fmt_bound(self.lower, decimals),
                fmt_bound(self.upper, decimals)
            ),
            (true, false) => format!("≥{}", fmt_bound(self.lower, decimals)),
            (false, true) => format!("≤{}", fmt_bound(self.upper, decimals)),
            (false, false) => "any".to_string(),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn fmt_bound(v: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(d) => format!("{:.*}", d, v),
        None => format!("{}", v),
    }
}

/// JSON shape: infinite bounds become `null`.
///
/// Both keys are required; an absent or misspelled key is an error rather
/// than an open bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdRepr {
    #[serde(deserialize_with = "nullable_bound")]
    lower: Option<f64>,
    #[serde(deserialize_with = "nullable_bound")]
    upper: Option<f64>,
}

/// `null` or a number, with the key itself mandatory
fn nullable_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}

impl From<Threshold> for ThresholdRepr {
    fn from(t: Threshold) -> Self {
        ThresholdRepr {
            lower: t.has_lower_bound().then_some(t.lower),
            upper: t.has_upper_bound().then_some(t.upper),
        }
    }
}

impl TryFrom<ThresholdRepr> for Threshold {
    type Error = ClassifyError;

    fn try_from(repr: ThresholdRepr) -> Result<Self, Self::Error> {
        if repr.lower.is_none() && repr.upper.is_none() {
            return Err(ClassifyError::MalformedRange(
                "{\"lower\": null, \"upper\": null}".to_string(),
            ));
        }
        Threshold::new(
            repr.lower.unwrap_or(f64::NEG_INFINITY),
            repr.upper.unwrap_or(f64::INFINITY),
        )
    }
}

// ============================================================================
// EMBEDDED THRESHOLD TABLE
// ============================================================================

/// One table row: parameter with its rice and maize ranges
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRow {
    pub parameter: SoilParameter,
    pub rice: Threshold,
    pub maize: Threshold,
}

impl ThresholdRow {
    pub fn for_crop(&self, crop: Crop) -> Threshold {
        match crop {
            Crop::Rice => self.rice,
            Crop::Maize => self.maize,
        }
    }
}

const UNBOUNDED: f64 = f64::INFINITY;

static THRESHOLD_TABLE: &[ThresholdRow] = &[
    ThresholdRow { parameter: SoilParameter::Ph, rice: Threshold::table(6.0, 7.0), maize: Threshold::table(6.0, 7.0) },
    ThresholdRow { parameter: SoilParameter::AvailableP, rice: Threshold::table(30.0, 80.0), maize: Threshold::table(30.0, 80.0) },
    ThresholdRow { parameter: SoilParameter::ExchangeableK, rice: Threshold::table(80.0, 180.0), maize: Threshold::table(85.0, 200.0) },
    ThresholdRow { parameter: SoilParameter::Calcium, rice: Threshold::table(400.0, 900.0), maize: Threshold::table(400.0, 950.0) },
    ThresholdRow { parameter: SoilParameter::Magnesium, rice: Threshold::table(60.0, 150.0), maize: Threshold::table(50.0, 100.0) },
    ThresholdRow { parameter: SoilParameter::Iron, rice: Threshold::table(115.0, 160.0), maize: Threshold::table(120.0, 165.0) },
    ThresholdRow { parameter: SoilParameter::Manganese, rice: Threshold::table(25.0, 80.0), maize: Threshold::table(30.0, 75.0) },
    ThresholdRow { parameter: SoilParameter::Boron, rice: Threshold::table(0.9, UNBOUNDED), maize: Threshold::table(0.85, UNBOUNDED) },
    ThresholdRow { parameter: SoilParameter::Copper, rice: Threshold::table(0.2, 1.2), maize: Threshold::table(0.2, 1.2) },
    ThresholdRow { parameter: SoilParameter::Zinc, rice: Threshold::table(0.1, UNBOUNDED), maize: Threshold::table(2.0, 12.0) },
    ThresholdRow { parameter: SoilParameter::Cec, rice: Threshold::table(4.0, 7.0), maize: Threshold::table(3.0, 8.0) },
    ThresholdRow { parameter: SoilParameter::TotalNitrogen, rice: Threshold::table(0.02, 0.07), maize: Threshold::table(0.09, 0.12) },
    ThresholdRow { parameter: SoilParameter::OrganicMatter, rice: Threshold::table(1.5, 1.8), maize: Threshold::table(1.5, 1.7) },
    ThresholdRow { parameter: SoilParameter::CarbonNitrogenRatio, rice: Threshold::table(10.0, 14.0), maize: Threshold::table(9.0, 15.0) },
];

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// All table rows in report order
pub fn threshold_table() -> &'static [ThresholdRow] {
    THRESHOLD_TABLE
}

/// Table row for a parameter
pub fn row(parameter: SoilParameter) -> &'static ThresholdRow {
    // Rows are stored in `SoilParameter::ALL` order
    &THRESHOLD_TABLE[parameter as usize]
}

/// Acceptable range for `parameter` on `crop`
pub fn threshold(parameter: SoilParameter, crop: Crop) -> Threshold {
    row(parameter).for_crop(crop)
}

/// Band a reading for a named parameter and crop.
///
/// # Examples
/// ```
/// use soil_report_rust::thresholds::{classify_parameter, Crop, SoilParameter};
/// use soil_report_rust::Band;
///
/// let band = classify_parameter(SoilParameter::ExchangeableK, Crop::Rice, 85.0).unwrap();
/// assert_eq!(band, Band::Adequate);
/// ```
pub fn classify_parameter(
    parameter: SoilParameter,
    crop: Crop,
    value: f64,
) -> Result<Band, ClassifyError> {
    threshold(parameter, crop).classify(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_are_well_formed() {
        assert_eq!(THRESHOLD_TABLE.len(), SoilParameter::ALL.len());
        for (idx, row) in THRESHOLD_TABLE.iter().enumerate() {
            assert_eq!(row.parameter, SoilParameter::ALL[idx], "row {} out of order", idx);
            for crop in Crop::ALL {
                let t = row.for_crop(crop);
                assert!(Threshold::new(t.lower(), t.upper()).is_ok(), "{} {} invalid", row.parameter, crop);
            }
        }
    }

    #[test]
    fn test_table_values() {
        assert_eq!(threshold(SoilParameter::ExchangeableK, Crop::Maize), Threshold::table(85.0, 200.0));
        assert_eq!(threshold(SoilParameter::Magnesium, Crop::Maize).upper(), 100.0);
        assert_eq!(threshold(SoilParameter::TotalNitrogen, Crop::Rice).lower(), 0.02);
        assert!(!threshold(SoilParameter::Boron, Crop::Rice).has_upper_bound());
        assert!(!threshold(SoilParameter::Zinc, Crop::Rice).has_upper_bound());
        assert!(threshold(SoilParameter::Zinc, Crop::Maize).has_upper_bound());
    }

    #[test]
    fn test_display() {
        assert_eq!(threshold(SoilParameter::Ph, Crop::Rice).display(), "6-7");
        assert_eq!(SoilParameter::Ph.range_display(Crop::Rice), "6.0-7.0");
        assert_eq!(SoilParameter::Cec.range_display(Crop::Maize), "3-8");
        assert_eq!(threshold(SoilParameter::Calcium, Crop::Maize).display(), "400-950");
        assert_eq!(threshold(SoilParameter::Boron, Crop::Maize).display(), "≥0.85");
        assert_eq!(threshold(SoilParameter::Copper, Crop::Rice).display(), "0.2-1.2");
        assert_eq!(Threshold::at_most(1.2).unwrap().display(), "≤1.2");
    }

    #[test]
    fn test_new_rejects_bad_bounds() {
        assert!(matches!(
            Threshold::new(80.0, 30.0),
            Err(ClassifyError::InvertedRange { .. })
        ));
        assert!(matches!(Threshold::new(f64::NAN, 1.0), Err(ClassifyError::InvalidBound)));
        assert!(Threshold::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(SoilParameter::from_alias("Phosporus"), Some(SoilParameter::AvailableP));
        assert_eq!(SoilParameter::from_alias("phosphorus"), Some(SoilParameter::AvailableP));
        assert_eq!(SoilParameter::from_alias("pH Level"), Some(SoilParameter::Ph));
        assert_eq!(SoilParameter::from_alias("pH (in water)"), Some(SoilParameter::Ph));
        assert_eq!(SoilParameter::from_alias("organicMatter"), Some(SoilParameter::OrganicMatter));
        assert_eq!(SoilParameter::from_alias("organic_matter"), Some(SoilParameter::OrganicMatter));
        assert_eq!(SoilParameter::from_alias("C/N"), Some(SoilParameter::CarbonNitrogenRatio));
        assert_eq!(SoilParameter::from_alias("Texture"), None);

        for p in SoilParameter::ALL {
            assert_eq!(SoilParameter::from_alias(p.name()), Some(p));
            assert_eq!(SoilParameter::from_alias(p.sheet_column()), Some(p));
        }
    }

    #[test]
    fn test_crop_names() {
        assert_eq!(Crop::from_name(" RICE "), Some(Crop::Rice));
        assert_eq!(Crop::from_name("corn"), Some(Crop::Maize));
        assert_eq!(Crop::from_name("sorghum"), None);
    }

    #[test]
    fn test_threshold_json() {
        let json = serde_json::to_value(threshold(SoilParameter::Boron, Crop::Rice)).unwrap();
        assert_eq!(json["lower"], 0.9);
        assert!(json["upper"].is_null());

        let parsed: Threshold = serde_json::from_str(r#"{"lower": 30.0, "upper": 80.0}"#).unwrap();
        assert_eq!(parsed, Threshold::table(30.0, 80.0));

        let inverted: Result<Threshold, _> = serde_json::from_str(r#"{"lower": 80.0, "upper": 30.0}"#);
        assert!(inverted.is_err());

        let floor: Threshold = serde_json::from_str(r#"{"lower": 0.9, "upper": null}"#).unwrap();
        assert_eq!(floor, Threshold::at_least(0.9).unwrap());
    }

    #[test]
    fn test_from_json_keeps_typed_errors() {
        let t = Threshold::from_json(&serde_json::json!({"lower": 30, "upper": 80})).unwrap();
        assert_eq!(t, Threshold::table(30.0, 80.0));
        assert_eq!(Threshold::from_json(&serde_json::json!("≥0.9")).unwrap(), Threshold::at_least(0.9).unwrap());

        assert_eq!(
            Threshold::from_json(&serde_json::json!({"lower": 80, "upper": 30})),
            Err(ClassifyError::InvertedRange { lower: 80.0, upper: 30.0 })
        );
        assert!(matches!(
            Threshold::from_json(&serde_json::json!({"min": 30, "max": 80})),
            Err(ClassifyError::MalformedRange(_))
        ));
        assert!(matches!(
            Threshold::from_json(&serde_json::json!({"lower": null, "upper": null})),
            Err(ClassifyError::MalformedRange(_))
        ));
        assert!(matches!(
            Threshold::from_json(&serde_json::json!([30, 80])),
            Err(ClassifyError::MalformedRange(_))
        ));
    }

    #[test]
    fn test_threshold_json_rejects_open_or_unknown_shapes() {
        let rejected = [
            r#"{}"#,
            r#"{"min": 30, "max": 80}"#,
            r#"{"lower": 30}"#,
            r#"{"upper": 80}"#,
            r#"{"lower": 30, "upper": 80, "unit": "ppm"}"#,
            r#"{"lower": null, "upper": null}"#,
        ];
        for json in rejected {
            let parsed: Result<Threshold, _> = serde_json::from_str(json);
            assert!(parsed.is_err(), "{} should not parse", json);
        }
    }
}
