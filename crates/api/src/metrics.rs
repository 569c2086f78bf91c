use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    rejected_requests: AtomicUsize,
    fallbacks: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,
    total_chart_time_us: AtomicU64,

    // Counts
    extractions: AtomicUsize,
    charts_built: AtomicUsize,
    total_data_points: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            rejected_requests: AtomicUsize::new(0),
            fallbacks: AtomicUsize::new(0),
            total_extract_time_us: AtomicU64::new(0),
            total_chart_time_us: AtomicU64::new(0),
            extractions: AtomicUsize::new(0),
            charts_built: AtomicUsize::new(0),
            total_data_points: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A request turned away because another one was in flight
    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extract(&self, duration: Duration, data_points: usize) {
        self.total_extract_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.extractions.fetch_add(1, Ordering::Relaxed);
        self.total_data_points.fetch_add(data_points, Ordering::Relaxed);
    }

    pub fn record_chart(&self, duration: Duration) {
        self.total_chart_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.charts_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            avg_extract_time_ms: avg_time_ms(&self.total_extract_time_us, &self.extractions),
            avg_chart_time_ms: avg_time_ms(&self.total_chart_time_us, &self.charts_built),
            charts_built: self.charts_built.load(Ordering::Relaxed),
            total_data_points: self.total_data_points.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub rejected_requests: usize,
    pub fallbacks: usize,
    pub avg_extract_time_ms: f64,
    pub avg_chart_time_ms: f64,
    pub charts_built: usize,
    pub total_data_points: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
