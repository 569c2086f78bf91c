use anyhow::{Context, Result, bail};
use chart::PercentSuffix;
use extract::ScanOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub service: ServiceConfig,
    pub chart: ChartConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Auto,       // Structured when a credential is set, pattern as fallback
    Pattern,    // Local regex only, never calls the service
    Structured, // Service only, failures are reported as-is
}

impl FromStr for ExtractionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "pattern" => Ok(Self::Pattern),
            "structured" => Ok(Self::Structured),
            other => bail!("unknown extraction mode '{}' (expected auto, pattern or structured)", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    pub scan_order: ScanOrder,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Opaque credential, passed through unvalidated
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub stagger_ms: u64,
    pub percent_suffix: PercentSuffix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig {
                mode: ExtractionMode::Auto,
                scan_order: ScanOrder::Pattern,
            },
            service: ServiceConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4".to_string(),
                temperature: 0.3,
                request_timeout_secs: 60,
                api_key: None,
            },
            chart: ChartConfig {
                stagger_ms: chart::DEFAULT_STAGGER_MS,
                percent_suffix: PercentSuffix::Category,
            },
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 500,
                max_backoff_ms: 5000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 1000,
            },
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
                log_format: LogFormat::Pretty,
            },
        }
    }
}

impl AppConfig {
    /// Load from the process environment, honoring a `.env` file if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key -> value source; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        config.service.api_key = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty());

        if let Some(mode) = get("STORYSIGHT_MODE") {
            config.extraction.mode = mode.parse().context("Invalid STORYSIGHT_MODE")?;
        }
        if let Some(order) = get("STORYSIGHT_SCAN_ORDER") {
            config.extraction.scan_order = parse_scan_order(&order)?;
        }
        if let Some(url) = get("STORYSIGHT_BASE_URL") {
            config.service.base_url = url;
        }
        if let Some(model) = get("STORYSIGHT_MODEL") {
            config.service.model = model;
        }
        if let Some(secs) = get("STORYSIGHT_TIMEOUT_SECS") {
            config.service.request_timeout_secs = secs.parse().context("Invalid STORYSIGHT_TIMEOUT_SECS")?;
        }
        if let Some(ms) = get("STORYSIGHT_STAGGER_MS") {
            config.chart.stagger_ms = ms.parse().context("Invalid STORYSIGHT_STAGGER_MS")?;
        }
        if let Some(rule) = get("STORYSIGHT_PERCENT_SUFFIX") {
            config.chart.percent_suffix = parse_percent_suffix(&rule)?;
        }
        if let Some(n) = get("STORYSIGHT_MAX_RETRIES") {
            config.retry.max_retries = n.parse().context("Invalid STORYSIGHT_MAX_RETRIES")?;
        }
        if let Some(n) = get("STORYSIGHT_CACHE_ENTRIES") {
            let max_entries: usize = n.parse().context("Invalid STORYSIGHT_CACHE_ENTRIES")?;
            config.cache.max_entries = max_entries;
            config.cache.enabled = max_entries > 0;
        }
        if let Some(addr) = get("STORYSIGHT_BIND") {
            config.server.bind_addr = addr;
        }
        if let Some(format) = get("LOG_FORMAT") {
            config.server.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => bail!("Invalid LOG_FORMAT '{}' (expected json or pretty)", other),
            };
        }

        Ok(config)
    }

    /// Whether the structured extractor takes part in extraction
    pub fn uses_structured(&self) -> bool {
        match self.extraction.mode {
            ExtractionMode::Pattern => false,
            ExtractionMode::Structured => true,
            ExtractionMode::Auto => self.service.api_key.is_some(),
        }
    }
}

fn parse_scan_order(value: &str) -> Result<ScanOrder> {
    match value.to_ascii_lowercase().as_str() {
        "pattern" => Ok(ScanOrder::Pattern),
        "text" => Ok(ScanOrder::Text),
        other => bail!("Invalid STORYSIGHT_SCAN_ORDER '{}' (expected pattern or text)", other),
    }
}

fn parse_percent_suffix(value: &str) -> Result<PercentSuffix> {
    match value.to_ascii_lowercase().as_str() {
        "category" => Ok(PercentSuffix::Category),
        "below-hundred" => Ok(PercentSuffix::BelowHundred),
        "never" => Ok(PercentSuffix::Never),
        other => bail!(
            "Invalid STORYSIGHT_PERCENT_SUFFIX '{}' (expected category, below-hundred or never)",
            other
        ),
    }
}
