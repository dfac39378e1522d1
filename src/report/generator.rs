use crate::report::types::*;
use crate::thresholds::{threshold_table, Crop, SoilParameter};
use anyhow::{Context, Result};

/// Builds soil reports from lab samples
///
/// Every table parameter gets a row, in table order, whether or not it was
/// measured. Measured values are banded for each configured crop.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    crops: Vec<Crop>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator {
    /// Generator covering every crop in the threshold table
    pub fn new() -> Self {
        Self {
            crops: Crop::ALL.to_vec(),
        }
    }

    /// Generator restricted to the given crops (order is kept)
    pub fn with_crops(crops: &[Crop]) -> Self {
        let mut unique = Vec::with_capacity(crops.len());
        for crop in crops {
            if !unique.contains(crop) {
                unique.push(*crop);
            }
        }
        Self { crops: unique }
    }

    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }

    /// Generate a report stamped with the current UTC time
    pub fn generate(&self, sample: &SoilSample) -> Result<SoilReport> {
        self.generate_at(sample, chrono::Utc::now().to_rfc3339())
    }

    /// Generate a report with an explicit timestamp
    pub fn generate_at(&self, sample: &SoilSample, generated_at: String) -> Result<SoilReport> {
        let mut summaries: Vec<BandSummary> = self
            .crops
            .iter()
            .map(|crop| BandSummary {
                crop: Some(*crop),
                ..Default::default()
            })
            .collect();

        let mut entries = Vec::with_capacity(threshold_table().len());
        for row in threshold_table() {
            let entry = self
                .build_entry(row.parameter, sample.reading(row.parameter))
                .with_context(|| {
                    format!(
                        "Failed to classify {} for sample '{}'",
                        row.parameter,
                        sample.unique_id()
                    )
                })?;

            for (summary, assessment) in summaries.iter_mut().zip(&entry.assessments) {
                summary.record(assessment.band);
            }
            entries.push(entry);
        }

        Ok(SoilReport {
            farmer: sample.farmer.clone(),
            texture: sample.texture.clone(),
            source: sample.source.clone(),
            generated_at,
            crops: self.crops.clone(),
            entries,
            summaries,
        })
    }

    fn build_entry(&self, parameter: SoilParameter, value: Option<f64>) -> Result<ReportEntry> {
        let mut assessments = Vec::with_capacity(self.crops.len());
        for &crop in &self.crops {
            let range = parameter.threshold(crop);
            let band = match value {
                Some(v) => Some(range.classify(v)?),
                None => None,
            };
            assessments.push(CropAssessment {
                crop,
                range,
                range_display: parameter.range_display(crop),
                band,
            });
        }

        Ok(ReportEntry {
            parameter,
            unit: parameter.unit().to_string(),
            value,
            assessments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Band;

    fn sample() -> SoilSample {
        SoilSample::new("NG-KD-0001")
            .with_reading(SoilParameter::Ph, 6.7)
            .with_reading(SoilParameter::AvailableP, 20.0)
            .with_reading(SoilParameter::ExchangeableK, 50.0)
            .with_reading(SoilParameter::Magnesium, 120.0)
            .with_reading(SoilParameter::Boron, 1000.0)
    }

    #[test]
    fn test_entries_follow_table_order() {
        let report = ReportGenerator::new()
            .generate_at(&sample(), "2024-01-01T00:00:00+00:00".to_string())
            .unwrap();

        assert_eq!(report.entries.len(), SoilParameter::ALL.len());
        for (entry, param) in report.entries.iter().zip(SoilParameter::ALL) {
            assert_eq!(entry.parameter, param);
        }
        assert_eq!(report.generated_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_bands_per_crop() {
        let report = ReportGenerator::new().generate(&sample()).unwrap();

        let ph = report.entry(SoilParameter::Ph).unwrap();
        assert_eq!(ph.band(Crop::Rice), Some(Band::Adequate));
        assert_eq!(ph.band(Crop::Maize), Some(Band::Adequate));

        let k = report.entry(SoilParameter::ExchangeableK).unwrap();
        assert_eq!(k.band(Crop::Rice), Some(Band::VeryLow));

        // Magnesium: rice 60-150, maize 50-100
        let mg = report.entry(SoilParameter::Magnesium).unwrap();
        assert_eq!(mg.band(Crop::Rice), Some(Band::Adequate));
        assert_eq!(mg.band(Crop::Maize), Some(Band::High));

        let b = report.entry(SoilParameter::Boron).unwrap();
        assert_eq!(b.band(Crop::Rice), Some(Band::Adequate));
        assert_eq!(b.assessment(Crop::Rice).unwrap().range_display, "≥0.9");
    }

    #[test]
    fn test_missing_reading_is_not_zero() {
        let report = ReportGenerator::new().generate(&sample()).unwrap();

        let zinc = report.entry(SoilParameter::Zinc).unwrap();
        assert_eq!(zinc.value, None);
        assert_eq!(zinc.band(Crop::Rice), None);
        assert_eq!(zinc.assessment(Crop::Maize).unwrap().band_label(), "Not measured");
    }

    #[test]
    fn test_summaries() {
        let report = ReportGenerator::new().generate(&sample()).unwrap();

        let rice = report.summary(Crop::Rice).unwrap();
        assert_eq!(rice.measured(), 5);
        assert_eq!(rice.not_measured, 9);
        assert_eq!(rice.very_low, 2);
        assert_eq!(rice.adequate, 3);

        let maize = report.summary(Crop::Maize).unwrap();
        assert_eq!(maize.high, 1);
    }

    #[test]
    fn test_non_finite_reading_fails_with_context() {
        let bad = SoilSample::new("NG-KD-0002").with_reading(SoilParameter::Calcium, f64::NAN);
        let err = ReportGenerator::new().generate(&bad).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Calcium"));
        assert!(msg.contains("NG-KD-0002"));
    }

    #[test]
    fn test_single_crop_generator() {
        let report = ReportGenerator::with_crops(&[Crop::Maize, Crop::Maize])
            .generate(&sample())
            .unwrap();
        assert_eq!(report.crops, vec![Crop::Maize]);
        assert!(report.entries.iter().all(|e| e.assessments.len() == 1));
        assert!(report.summary(Crop::Rice).is_none());
    }
}
