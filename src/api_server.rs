// Axum API Server Module
//
// Purpose: REST API over the threshold classifier, report generator and
// uploaded sample store.

#[cfg(feature = "api")]
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use serde::Deserialize;

#[cfg(feature = "api")]
use std::collections::HashMap;

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use tokio::sync::RwLock;

#[cfg(feature = "api")]
use crate::classify::{parse_reading, ClassifyError};

#[cfg(feature = "api")]
use crate::config::ServerConfig;

#[cfg(feature = "api")]
use crate::ingest::{load_samples_csv, parse_samples_csv};

#[cfg(feature = "api")]
use crate::report::{render, FarmerInfo, ReportFormat, ReportGenerator, SoilSample};

#[cfg(feature = "api")]
use crate::store::SampleStore;

#[cfg(feature = "api")]
use crate::thresholds::{threshold_table, Crop, SoilParameter, Threshold};

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<SampleStore>>,
    pub generator: Arc<ReportGenerator>,
    /// Rendered reports keyed by "<unique id>:<format>"
    pub cache: Cache<String, Arc<String>>,
}

#[cfg(feature = "api")]
impl AppState {
    /// Build state from config, preloading `SAMPLES_CSV` when set
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let mut store = SampleStore::new();

        if let Some(path) = &config.samples_csv {
            tracing::info!("Preloading samples from {:?}...", path);
            let result = load_samples_csv(path)?;
            let outcome = store.extend(result.samples);
            tracing::info!(
                "Preloaded {} samples ({} replaced, {} rows skipped)",
                outcome.inserted,
                outcome.replaced,
                result.summary.skipped.len()
            );
        }

        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: SampleStore, config: &ServerConfig) -> Self {
        tracing::info!("Initializing Moka report cache...");
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            store: Arc::new(RwLock::new(store)),
            generator: Arc::new(ReportGenerator::new()),
            cache,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Threshold table
        .route("/api/thresholds", get(get_thresholds))
        .route("/api/thresholds/:crop", get(get_crop_thresholds))

        // Classification and ad-hoc reports
        .route("/api/classify", post(classify_value))
        .route("/api/reports", post(create_report))

        // Uploaded samples
        .route("/api/samples", get(search_samples))
        .route("/api/samples/upload", post(upload_samples))
        .route("/api/samples/:id/report", get(get_sample_report))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

/// A reading sent as a number or as text ("6.5")
#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReadingInput {
    Number(f64),
    Text(String),
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    value: Option<ReadingInput>,
    parameter: Option<String>,
    crop: Option<String>,
    /// Bounds (`{"lower": 0.9, "upper": null}`) or text ("30-80"),
    /// converted by `Threshold::from_json` so range errors stay typed
    range: Option<serde_json::Value>,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct ReportRequest {
    farmer: FarmerInfo,
    #[serde(default)]
    readings: HashMap<String, Option<f64>>,
    texture: Option<String>,
    source: Option<String>,
    /// Restrict the report to these crops (default: all)
    crops: Option<Vec<String>>,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(feature = "api")]
async fn get_thresholds() -> Json<serde_json::Value> {
    let rows: Vec<serde_json::Value> = threshold_table()
        .iter()
        .map(|row| {
            let mut entry = serde_json::json!({
                "parameter": row.parameter,
                "unit": row.parameter.unit(),
            });
            for crop in Crop::ALL {
                let key = crop.name().to_lowercase();
                entry[key.as_str()] = serde_json::json!({
                    "range": row.for_crop(crop),
                    "display": row.parameter.range_display(crop),
                });
            }
            entry
        })
        .collect();

    Json(serde_json::json!({ "crops": Crop::ALL, "thresholds": rows }))
}

#[cfg(feature = "api")]
async fn get_crop_thresholds(
    Path(crop): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let crop = Crop::from_name(&crop)
        .ok_or_else(|| AppError::NotFound(format!("Unknown crop: {}", crop)))?;

    let rows: Vec<serde_json::Value> = threshold_table()
        .iter()
        .map(|row| {
            serde_json::json!({
                "parameter": row.parameter,
                "unit": row.parameter.unit(),
                "range": row.for_crop(crop),
                "display": row.parameter.range_display(crop),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "crop": crop, "thresholds": rows })))
}

/// Band a single reading against a table range or an explicit range
#[cfg(feature = "api")]
async fn classify_value(
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let value = match payload.value {
        Some(ReadingInput::Number(v)) => v,
        Some(ReadingInput::Text(text)) => parse_reading(&text)?,
        None => return Err(ClassifyError::MissingValue.into()),
    };

    let (range, parameter, crop) = match (payload.range, payload.parameter, payload.crop) {
        (Some(range), _, _) => (Threshold::from_json(&range)?, None, None),
        (None, Some(parameter), Some(crop)) => {
            let parameter = SoilParameter::from_alias(&parameter)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown soil parameter: {}", parameter)))?;
            let crop = Crop::from_name(&crop)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown crop: {}", crop)))?;
            (parameter.threshold(crop), Some(parameter), Some(crop))
        }
        _ => {
            return Err(AppError::BadRequest(
                "Provide either 'range' or both 'parameter' and 'crop'".to_string(),
            ))
        }
    };

    let band = range.classify(value)?;

    Ok(Json(serde_json::json!({
        "value": value,
        "band": band,
        "range": range,
        "range_display": match parameter {
            Some(p) => crop.map(|c| p.range_display(c)).unwrap_or_else(|| range.display()),
            None => range.display(),
        },
        "parameter": parameter,
        "crop": crop,
    })))
}

/// Build and render a report for a sample sent in the request body
#[cfg(feature = "api")]
async fn create_report(
    Query(query): Query<FormatQuery>,
    Json(payload): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let format = parse_format(query.format.as_deref())?;

    let readings = SoilSample::readings_from_names(&payload.readings)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if payload.farmer.unique_id.trim().is_empty() {
        return Err(AppError::BadRequest("farmer.unique_id is required".to_string()));
    }

    let generator = match &payload.crops {
        Some(names) => {
            let crops = names
                .iter()
                .map(|name| {
                    Crop::from_name(name)
                        .ok_or_else(|| AppError::BadRequest(format!("Unknown crop: {}", name)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            ReportGenerator::with_crops(&crops)
        }
        None => ReportGenerator::new(),
    };

    let sample = SoilSample {
        farmer: payload.farmer,
        readings,
        texture: payload.texture,
        source: payload.source,
    };

    let report = generator
        .generate(&sample)
        .map_err(|e| AppError::Unprocessable(format!("{:#}", e)))?;
    let body = render(&report, format).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(rendered(format, body))
}

/// Ingest a CSV upload into the sample store
#[cfg(feature = "api")]
async fn upload_samples(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }

    // CPU-bound work: run in blocking thread pool
    let result = tokio::task::spawn_blocking(move || parse_samples_csv(&body))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::BadRequest(format!("{:#}", e)))?;

    let outcome = {
        let mut store = state.store.write().await;
        let outcome = store.extend(result.samples);
        // Invalidate under the write lock: report handlers insert into the
        // cache only while holding the read lock
        state.cache.invalidate_all();
        outcome
    };

    let total = state.store.read().await.len();
    tracing::info!(
        "Upload stored {} new and {} replaced samples ({} total)",
        outcome.inserted,
        outcome.replaced,
        total
    );

    Ok(Json(serde_json::json!({
        "summary": result.summary,
        "inserted": outcome.inserted,
        "replaced": outcome.replaced,
        "total": total,
    })))
}

#[cfg(feature = "api")]
async fn search_samples(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    let matches = store.search(query.q.as_deref().unwrap_or(""));

    Json(serde_json::json!({
        "count": matches.len(),
        "samples": matches,
    }))
}

/// Rendered report for a stored sample (cached)
#[cfg(feature = "api")]
async fn get_sample_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, AppError> {
    let format = parse_format(query.format.as_deref())?;
    let cache_key = format!("{}:{}", id, format.extension());

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(rendered(format, cached.as_ref().clone()));
    }

    // Held until the cache insert so an upload cannot replace the sample and
    // clear the cache in between
    let store = state.store.read().await;
    let sample = store
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Sample not found: {}", id)))?;

    let report = state
        .generator
        .generate(sample)
        .map_err(|e| AppError::Unprocessable(format!("{:#}", e)))?;
    let body = render(&report, format).map_err(|e| AppError::Internal(e.to_string()))?;

    state.cache.insert(cache_key, Arc::new(body.clone())).await;
    drop(store);

    Ok(rendered(format, body))
}

// ============================================================================
// Helpers
// ============================================================================

#[cfg(feature = "api")]
fn parse_format(name: Option<&str>) -> Result<ReportFormat, AppError> {
    match name {
        None => Ok(ReportFormat::default()),
        Some(name) => ReportFormat::from_name(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown report format: {}", name))),
    }
}

#[cfg(feature = "api")]
fn rendered(format: ReportFormat, body: String) -> Response {
    ([(header::CONTENT_TYPE, format.content_type())], body).into_response()
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

#[cfg(feature = "api")]
impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
