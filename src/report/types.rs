use crate::classify::Band;
use crate::thresholds::{Crop, SoilParameter, Threshold};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Who and where a sample came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmerInfo {
    pub unique_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lga: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// One lab sample: farmer details plus the measured parameters.
///
/// A parameter absent from `readings` was not measured. It is never treated
/// as a zero reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    pub farmer: FarmerInfo,
    #[serde(default)]
    pub readings: BTreeMap<SoilParameter, f64>,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl SoilSample {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            farmer: FarmerInfo {
                unique_id: unique_id.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Builder-style reading insert
    pub fn with_reading(mut self, parameter: SoilParameter, value: f64) -> Self {
        self.readings.insert(parameter, value);
        self
    }

    pub fn reading(&self, parameter: SoilParameter) -> Option<f64> {
        self.readings.get(&parameter).copied()
    }

    pub fn unique_id(&self) -> &str {
        &self.farmer.unique_id
    }

    /// Build readings from loosely named keys ("pH", "organicMatter",
    /// "Phosporus"). Unknown names are rejected, as are two keys naming the
    /// same parameter ("P" and "Phosphorus"), even when one is `None`.
    /// `None` values are skipped.
    pub fn readings_from_names(
        named: &HashMap<String, Option<f64>>,
    ) -> Result<BTreeMap<SoilParameter, f64>> {
        let mut seen: BTreeMap<SoilParameter, &str> = BTreeMap::new();
        let mut readings = BTreeMap::new();
        for (name, value) in named {
            let parameter = SoilParameter::from_alias(name)
                .ok_or_else(|| anyhow!("Unknown soil parameter '{}'", name))?;
            if let Some(previous) = seen.insert(parameter, name.as_str()) {
                // Report the pair in a stable order regardless of map iteration
                let (a, b) = if previous < name.as_str() {
                    (previous, name.as_str())
                } else {
                    (name.as_str(), previous)
                };
                bail!("Parameter {} given twice ('{}' and '{}')", parameter, a, b);
            }
            if let Some(v) = value {
                readings.insert(parameter, *v);
            }
        }
        Ok(readings)
    }
}

/// Band for one crop on one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropAssessment {
    pub crop: Crop,
    pub range: Threshold,
    /// Range as printed on the report ("80-180", "≥0.9")
    pub range_display: String,
    /// `None` when the parameter was not measured
    pub band: Option<Band>,
}

impl CropAssessment {
    pub fn band_label(&self) -> &'static str {
        self.band.map(|b| b.label()).unwrap_or("Not measured")
    }
}

/// One row of the soil report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub parameter: SoilParameter,
    pub unit: String,
    pub value: Option<f64>,
    pub assessments: Vec<CropAssessment>,
}

impl ReportEntry {
    pub fn assessment(&self, crop: Crop) -> Option<&CropAssessment> {
        self.assessments.iter().find(|a| a.crop == crop)
    }

    pub fn band(&self, crop: Crop) -> Option<Band> {
        self.assessment(crop).and_then(|a| a.band)
    }

    pub fn value_display(&self) -> String {
        match self.value {
            Some(v) => format!("{}", v),
            None => "-".to_string(),
        }
    }
}

/// Band counts for one crop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSummary {
    pub crop: Option<Crop>,
    pub very_low: usize,
    pub adequate: usize,
    pub high: usize,
    pub not_measured: usize,
}

impl BandSummary {
    pub fn record(&mut self, band: Option<Band>) {
        match band {
            Some(Band::VeryLow) => self.very_low += 1,
            Some(Band::Adequate) => self.adequate += 1,
            Some(Band::High) => self.high += 1,
            None => self.not_measured += 1,
        }
    }

    pub fn measured(&self) -> usize {
        self.very_low + self.adequate + self.high
    }
}

/// Complete soil analysis report for a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReport {
    pub farmer: FarmerInfo,
    pub texture: Option<String>,
    pub source: Option<String>,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub crops: Vec<Crop>,
    pub entries: Vec<ReportEntry>,
    pub summaries: Vec<BandSummary>,
}

impl SoilReport {
    pub fn entry(&self, parameter: SoilParameter) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.parameter == parameter)
    }

    pub fn summary(&self, crop: Crop) -> Option<&BandSummary> {
        self.summaries.iter().find(|s| s.crop == Some(crop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, Option<f64>)]) -> HashMap<String, Option<f64>> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_readings_from_names() {
        let readings = SoilSample::readings_from_names(&named(&[
            ("pH", Some(6.2)),
            ("Phosporus", Some(40.0)),
            ("Zinc", None),
        ]))
        .unwrap();

        assert_eq!(readings.get(&SoilParameter::Ph), Some(&6.2));
        assert_eq!(readings.get(&SoilParameter::AvailableP), Some(&40.0));
        assert!(!readings.contains_key(&SoilParameter::Zinc));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = SoilSample::readings_from_names(&named(&[("Sulphur", Some(3.0))])).unwrap_err();
        assert!(err.to_string().contains("Sulphur"));
    }

    #[test]
    fn test_same_parameter_twice_rejected() {
        // Outcome must not depend on map iteration order
        for _ in 0..50 {
            let err = SoilSample::readings_from_names(&named(&[
                ("P", Some(10.0)),
                ("Phosphorus", Some(50.0)),
            ]))
            .unwrap_err();
            assert_eq!(err.to_string(), "Parameter Available P given twice ('P' and 'Phosphorus')");
        }

        assert!(SoilSample::readings_from_names(&named(&[("pH", Some(6.0)), ("ph", None)])).is_err());
    }
}
