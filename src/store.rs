//! In-memory sample store
//!
//! Keeps uploaded samples keyed by Unique ID in upload order and answers the
//! result-list search (case-insensitive substring over ID, State, LGA and
//! Ward).

use crate::report::SoilSample;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Outcome of storing one upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub inserted: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<SoilSample>,
    by_id: FxHashMap<String, usize>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample. A sample with the same Unique ID is replaced in place.
    ///
    /// Returns `true` when an existing sample was replaced.
    pub fn insert(&mut self, sample: SoilSample) -> bool {
        if let Some(&idx) = self.by_id.get(sample.unique_id()) {
            self.samples[idx] = sample;
            return true;
        }
        self.by_id
            .insert(sample.unique_id().to_string(), self.samples.len());
        self.samples.push(sample);
        false
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = SoilSample>) -> StoreOutcome {
        let mut outcome = StoreOutcome::default();
        for sample in samples {
            if self.insert(sample) {
                outcome.replaced += 1;
            } else {
                outcome.inserted += 1;
            }
        }
        outcome
    }

    pub fn get(&self, unique_id: &str) -> Option<&SoilSample> {
        self.by_id.get(unique_id).map(|&idx| &self.samples[idx])
    }

    /// All samples in upload order
    pub fn list(&self) -> &[SoilSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples whose ID, State, LGA or Ward contains `term` (any case).
    /// A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&SoilSample> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.samples.iter().collect();
        }

        self.samples
            .iter()
            .filter(|sample| {
                let farmer = &sample.farmer;
                std::iter::once(Some(farmer.unique_id.as_str()))
                    .chain([
                        farmer.state.as_deref(),
                        farmer.lga.as_deref(),
                        farmer.ward.as_deref(),
                    ])
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
