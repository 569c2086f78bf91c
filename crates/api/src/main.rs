mod cache;
mod config;
mod error;
mod metrics;
mod pipeline;
mod retry;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chart::{ChartKind, ChartSpec};
use extract::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheStats;
use crate::config::{AppConfig, ExtractionMode, LogFormat};
use crate::error::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::pipeline::{Pipeline, Visualization};

/// The extraction most recently turned into a chart
#[derive(Debug, Clone)]
struct LastRun {
    extraction: ExtractionResult,
    kind: ChartKind,
}

struct AppState {
    pipeline: Pipeline,
    metrics: Arc<Metrics>,
    // held for the whole of a /visualize run
    in_flight: Mutex<()>,
    last_run: RwLock<Option<LastRun>>,
}

impl AppState {
    fn new(pipeline: Pipeline, metrics: Arc<Metrics>) -> Self {
        Self {
            pipeline,
            metrics,
            in_flight: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    mode: ExtractionMode,
    structured_extraction: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisualizeRequest {
    text: String,
    #[serde(default)]
    chart_type: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ReplayRequest {
    #[serde(default)]
    chart_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayResponse {
    chart: ChartSpec,
    insights_text: String,
}

#[derive(Serialize)]
struct StatsResponse {
    requests: MetricsSnapshot,
    cache: Option<CacheStats>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.server.log_format);

    let metrics = Metrics::new();
    let pipeline = Pipeline::from_config(&config, metrics.clone())?;

    info!(
        mode = ?config.extraction.mode,
        structured = pipeline.structured_enabled(),
        model = %config.service.model,
        "pipeline ready"
    );

    let state = Arc::new(AppState::new(pipeline, metrics));
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/visualize", post(visualize))
        .route("/replay", post(replay))
        .route("/stats", get(get_stats))
        .with_state(state)
}

fn parse_kind(chart_type: Option<&str>) -> Result<ChartKind, ApiError> {
    chart_type
        .map(str::parse::<ChartKind>)
        .transpose()
        .map(Option::unwrap_or_default)
        .map_err(|e: chart::InvalidInputError| ApiError::BadRequest(e.to_string()))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: state.pipeline.mode(),
        structured_extraction: state.pipeline.structured_enabled(),
    })
}

async fn visualize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VisualizeRequest>,
) -> Result<Json<Visualization>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }
    let kind = parse_kind(req.chart_type.as_deref())?;
    let mode = match req.mode.as_deref() {
        Some(mode) => mode.parse::<ExtractionMode>().map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?,
        None => state.pipeline.mode(),
    };

    let Ok(_guard) = state.in_flight.try_lock() else {
        state.metrics.record_rejected();
        return Err(ApiError::Busy);
    };

    let outcome = state.pipeline.process_text_with_mode(&req.text, kind, mode).await;
    state.metrics.record_request(outcome.is_ok());
    let visualization = outcome?;

    *state.last_run.write().await = Some(LastRun {
        extraction: visualization.extraction.clone(),
        kind,
    });

    Ok(Json(visualization))
}

async fn replay(
    State(state): State<Arc<AppState>>,
    req: Option<Json<ReplayRequest>>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    let mut last_run = state.last_run.write().await;
    let run = last_run.as_mut().ok_or(ApiError::NothingToReplay)?;

    let kind = match req.chart_type.as_deref() {
        Some(chart_type) => parse_kind(Some(chart_type))?,
        None => run.kind,
    };

    let (chart, insights) = state
        .pipeline
        .render(&run.extraction, kind)
        .map_err(|e| ApiError::Pipeline(e.into()))?;
    run.kind = kind;

    Ok(Json(ReplayResponse {
        chart,
        insights_text: insights.to_text(),
    }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        requests: state.metrics.snapshot(),
        cache: state.pipeline.cache_stats(),
    })
}
