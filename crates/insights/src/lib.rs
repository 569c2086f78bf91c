pub mod summarizer;

pub use summarizer::{CategoryCount, InsightSummarizer, Insights, TrendCallout};

/// Summarize data points with the default summarizer
pub fn summarize(data_points: &[extract::DataPoint]) -> String {
    InsightSummarizer::new().summarize(data_points)
}
