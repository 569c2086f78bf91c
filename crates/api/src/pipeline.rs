use anyhow::{Context, Result};
use chart::{ChartKind, ChartSpec, ChartSpecBuilder, InvalidInputError};
use extract::{ExtractError, ExtractionResult, Extractor, PatternExtractor, StructuredExtractor};
use insights::{InsightSummarizer, Insights};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::cache::{CacheStats, ResultCache};
use crate::config::{AppConfig, ExtractionMode};
use crate::metrics::{Metrics, TimedOperation};
use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Chart(#[from] InvalidInputError),

    #[error("structured extraction is not configured")]
    StructuredUnavailable,
}

/// Everything produced by one run over a piece of text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualization {
    pub request_id: Uuid,
    pub extractor: &'static str,
    pub extraction: ExtractionResult,
    pub insights: Insights,
    pub insights_text: String,
    pub chart: ChartSpec,
}

/// Text -> data points -> insights + chart spec.
///
/// Holds no per-request state; callers keep whatever result they want to
/// replay later.
pub struct Pipeline {
    mode: ExtractionMode,
    pattern: PatternExtractor,
    structured: Option<StructuredExtractor>,
    builder: ChartSpecBuilder,
    summarizer: InsightSummarizer,
    retry: RetryPolicy,
    cache: Option<ResultCache>,
    metrics: Arc<Metrics>,
}

impl Pipeline {
    pub fn new(
        mode: ExtractionMode,
        pattern: PatternExtractor,
        structured: Option<StructuredExtractor>,
        builder: ChartSpecBuilder,
        retry: RetryPolicy,
        cache: Option<ResultCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            mode,
            pattern,
            structured,
            builder,
            summarizer: InsightSummarizer::new(),
            retry,
            cache,
            metrics,
        }
    }

    pub fn from_config(config: &AppConfig, metrics: Arc<Metrics>) -> Result<Self> {
        // built whenever a credential exists so requests may opt into it
        let structured = if config.uses_structured() || config.service.api_key.is_some() {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.service.request_timeout_secs))
                .build()
                .context("Failed to build HTTP client")?;

            Some(
                StructuredExtractor::new(
                    config.service.base_url.clone(),
                    config.service.model.clone(),
                    config.service.api_key.clone().unwrap_or_default(),
                )
                .with_client(client)
                .with_temperature(config.service.temperature),
            )
        } else {
            None
        };

        let cache = config
            .cache
            .enabled
            .then(|| ResultCache::new(config.cache.max_entries));

        Ok(Self::new(
            config.extraction.mode,
            PatternExtractor::with_scan_order(config.extraction.scan_order),
            structured,
            ChartSpecBuilder::new()
                .with_stagger_ms(config.chart.stagger_ms)
                .with_percent_suffix(config.chart.percent_suffix),
            RetryPolicy::from_config(&config.retry),
            cache,
            metrics,
        ))
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn structured_enabled(&self) -> bool {
        self.structured.is_some()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResultCache::stats)
    }

    /// Extractors to try for `mode`, in order
    fn chain(&self, mode: ExtractionMode) -> Vec<&dyn Extractor> {
        let structured = self.structured.as_ref().map(|s| s as &dyn Extractor);
        match mode {
            ExtractionMode::Pattern => vec![&self.pattern],
            ExtractionMode::Structured => structured.into_iter().collect(),
            ExtractionMode::Auto => structured
                .into_iter()
                .chain(std::iter::once(&self.pattern as &dyn Extractor))
                .collect(),
        }
    }

    pub async fn process_text(&self, text: &str, kind: ChartKind) -> Result<Visualization, PipelineError> {
        self.process_text_with_mode(text, kind, self.mode).await
    }

    pub async fn process_text_with_mode(
        &self,
        text: &str,
        kind: ChartKind,
        mode: ExtractionMode,
    ) -> Result<Visualization, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("process_text", %request_id, kind = %kind, chars = text.len());

        async move {
            if mode == ExtractionMode::Structured && self.structured.is_none() {
                return Err(PipelineError::StructuredUnavailable);
            }

            let timer = TimedOperation::start();
            let (extractor, extraction) = self.extract(text, mode).await?;
            self.metrics.record_extract(timer.elapsed(), extraction.data_points.len());

            let (chart, insights) = self.render(&extraction, kind)?;
            let insights_text = insights.to_text();

            info!(
                extractor,
                data_points = extraction.data_points.len(),
                "visualization ready"
            );

            Ok(Visualization {
                request_id,
                extractor,
                extraction,
                insights,
                insights_text,
                chart,
            })
        }
        .instrument(span)
        .await
    }

    /// Build the chart and insights for an existing extraction
    pub fn render(&self, extraction: &ExtractionResult, kind: ChartKind) -> Result<(ChartSpec, Insights), InvalidInputError> {
        let timer = TimedOperation::start();
        let chart = self.builder.build(&extraction.data_points, kind)?;
        self.metrics.record_chart(timer.elapsed());

        let insights = self.summarizer.analyze(&extraction.data_points);
        Ok((chart, insights))
    }

    async fn extract(&self, text: &str, mode: ExtractionMode) -> Result<(&'static str, ExtractionResult), ExtractError> {
        let chain = self.chain(mode);
        let last = chain.len().saturating_sub(1);

        for (position, extractor) in chain.into_iter().enumerate() {
            match self.run(extractor, text).await {
                Ok(result) => return Ok((extractor.name(), result)),
                Err(ExtractError::Extraction(e)) if position < last => {
                    warn!(
                        extractor = extractor.name(),
                        error = %e,
                        "extraction failed, falling back"
                    );
                    self.metrics.record_fallback();
                }
                Err(e) => return Err(e),
            }
        }

        Err(ExtractError::NoDataFound)
    }

    async fn run(&self, extractor: &dyn Extractor, text: &str) -> Result<ExtractionResult, ExtractError> {
        let name = extractor.name();
        let cache = self.cache.as_ref().filter(|_| extractor.is_remote());

        if let Some(hit) = cache.and_then(|c| c.get(name, text)) {
            debug!(extractor = name, "extraction served from cache");
            return Ok(hit);
        }

        let result = self
            .retry
            .retry(
                name,
                |e: &ExtractError| matches!(e, ExtractError::Extraction(inner) if inner.is_transient()),
                || extractor.extract_data(text),
            )
            .await?;

        if let Some(cache) = cache {
            cache.set(name, text, result.clone());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pattern_pipeline() -> Pipeline {
        let mut config = AppConfig::default();
        config.extraction.mode = ExtractionMode::Pattern;
        Pipeline::from_config(&config, Metrics::new()).unwrap()
    }

    fn service_pipeline(server: &MockServer, mode: ExtractionMode) -> Pipeline {
        let mut config = AppConfig::default();
        config.extraction.mode = mode;
        config.service.base_url = server.uri();
        config.service.api_key = Some("test-key".to_string());
        config.retry.initial_backoff_ms = 1;
        config.retry.max_backoff_ms = 1;
        Pipeline::from_config(&config, Metrics::new()).unwrap()
    }

    fn tool_call(arguments: serde_json::Value) -> serde_json::Value {
        json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "type": "function",
                        "function": { "name": "record_data_points", "arguments": arguments.to_string() }
                    }]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_pattern_pipeline_end_to_end() {
        let pipeline = pattern_pipeline();

        let viz = pipeline
            .process_text("Q3 sales reached $45K while traffic rose 12%", ChartKind::Pie)
            .await
            .unwrap();

        assert_eq!(viz.extractor, "pattern");
        assert_eq!(viz.extraction.data_points.len(), 2);
        assert_eq!(viz.chart.entries.len(), 2);
        assert_eq!(viz.chart.entries[0].label, "Q3 Sales");
        assert_eq!(viz.chart.entries[1].legend_text, "Traffic Growth: 12%");
        assert!(viz.insights_text.contains("Traffic Growth is increasing"));
    }

    #[tokio::test]
    async fn test_no_data_aborts_pipeline() {
        let err = pattern_pipeline()
            .process_text("no numbers here", ChartKind::Bar)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Extract(ExtractError::NoDataFound)));
    }

    #[tokio::test]
    async fn test_zero_pie_is_invalid_input() {
        let err = pattern_pipeline()
            .process_text("Conversion was 0% and churn 0%", ChartKind::Pie)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Chart(InvalidInputError::ZeroTotal)));
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_pattern() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(json!({"summary": "missing points"}))))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = service_pipeline(&server, ExtractionMode::Auto);
        let viz = pipeline.process_text("$45K in sales", ChartKind::Bar).await.unwrap();

        assert_eq!(viz.extractor, "pattern");
        assert_eq!(viz.extraction.data_points[0].value, 45000.0);
    }

    #[tokio::test]
    async fn test_auto_keeps_structured_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(json!({"dataPoints": [], "summary": ""}))))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = service_pipeline(&server, ExtractionMode::Auto);
        // the pattern extractor would find $45K here, but an empty answer from the service is final
        let err = pipeline.process_text("$45K in sales", ChartKind::Bar).await.unwrap_err();

        assert!(matches!(err, PipelineError::Extract(ExtractError::NoDataFound)));
        assert_eq!(pipeline.metrics.snapshot().fallbacks, 0);
    }

    #[tokio::test]
    async fn test_pattern_results_are_not_cached() {
        let pipeline = pattern_pipeline();
        pipeline.process_text("$45K in sales", ChartKind::Pie).await.unwrap();
        pipeline.process_text("$45K in sales", ChartKind::Pie).await.unwrap();

        let stats = pipeline.cache_stats().unwrap();
        assert_eq!(stats.results_cached, 0);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_structured_mode_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = service_pipeline(&server, ExtractionMode::Structured);
        let err = pipeline.process_text("$45K in sales", ChartKind::Bar).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Extract(ExtractError::Extraction(extract::ExtractionError::Status { status: 400, .. }))
        ));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let pipeline = service_pipeline(&server, ExtractionMode::Structured);
        let err = pipeline.process_text("$45K in sales", ChartKind::Bar).await.unwrap_err();

        assert!(matches!(err, PipelineError::Extract(ExtractError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_structured_results_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(json!({
                "dataPoints": [
                    {"value": 45000, "label": "Q3 Sales", "category": "Sales", "trend": "increasing"},
                    {"value": 12, "label": "Traffic", "category": "Percentage"}
                ],
                "summary": "Sales are up."
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = service_pipeline(&server, ExtractionMode::Structured);
        let first = pipeline.process_text("story", ChartKind::Pie).await.unwrap();
        let second = pipeline.process_text("story", ChartKind::Pie).await.unwrap();

        assert_eq!(first.extractor, "structured");
        assert_eq!(first.extraction, second.extraction);
        assert_eq!(first.chart, second.chart);
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(pipeline.cache_stats().unwrap().hits, 1);
    }

    #[tokio::test]
    async fn test_structured_override_without_credential() {
        let err = pattern_pipeline()
            .process_text_with_mode("$45K in sales", ChartKind::Pie, ExtractionMode::Structured)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::StructuredUnavailable));
    }

    #[test]
    fn test_render_rebuilds_other_kind() {
        let pipeline = pattern_pipeline();
        let extraction = ExtractionResult::new(
            vec![extract::DataPoint::new(10.0, "a", "Sales"), extract::DataPoint::new(30.0, "b", "Sales")],
            "",
        );

        let (bar, _) = pipeline.render(&extraction, ChartKind::Bar).unwrap();
        let (pie, insights) = pipeline.render(&extraction, ChartKind::Pie).unwrap();

        assert_eq!(bar.entries[1].bar().unwrap().height_fraction, 1.0);
        assert_eq!(pie.entries[1].slice().unwrap().sweep_angle_deg, 270.0);
        assert_eq!(insights.categories[0].count, 2);
    }
}
