//! Soil Report Rust Implementation
//!
//! Classifies soil lab readings into Very Low / Adequate / High bands against
//! the per-crop threshold table (rice, maize) and builds farmer reports.
//!
//! - `thresholds/`: the threshold table, crops, parameters and range parsing
//! - `classify`: the band classifier and reading parser
//! - `report/`: report generation plus markdown, HTML and JSON formatters
//! - `ingest`: CSV sheet loading with Polars, upload batching, parallel reports
//! - `store`: in-memory sample store with result-list search
//! - `api_server`: Axum REST API (feature `api`)

pub mod thresholds;
pub mod classify;
pub mod report;
pub mod ingest;
pub mod store;
pub mod config;
pub mod api_server;

// Re-export commonly used types
pub use classify::{classify, classify_threshold, parse_reading, Band, ClassifyError};
pub use thresholds::{parse_range, Crop, SoilParameter, Threshold};
pub use report::{ReportFormat, ReportGenerator, SoilReport, SoilSample};
pub use ingest::{build_reports, IngestSummary, BATCH_SIZE};
pub use store::SampleStore;
pub use config::ServerConfig;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
