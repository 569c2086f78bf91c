pub mod error;
pub mod llm;
pub mod normalizer;
pub mod pattern;
pub mod prompt;
pub mod schema;

pub use error::{ExtractError, ExtractionError};
pub use llm::StructuredExtractor;
pub use normalizer::DataPointNormalizer;
pub use pattern::{PatternExtractor, ScanOrder};
pub use schema::{DataPoint, ExtractionResult};

use async_trait::async_trait;

/// A strategy that turns raw text into data points.
///
/// Both strategies report an empty extraction as [`ExtractError::NoDataFound`]
/// so callers never chart an empty result.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs and responses
    fn name(&self) -> &'static str;

    /// Whether extraction goes over the network. Only remote results are worth caching.
    fn is_remote(&self) -> bool {
        false
    }

    async fn extract_data(&self, text: &str) -> Result<ExtractionResult, ExtractError>;
}

#[async_trait]
impl Extractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn extract_data(&self, text: &str) -> Result<ExtractionResult, ExtractError> {
        let data_points = self.extract(text);
        if data_points.is_empty() {
            return Err(ExtractError::NoDataFound);
        }

        let summary = format!("Found {} numeric value(s) in the text", data_points.len());
        Ok(ExtractionResult::new(data_points, summary))
    }
}

#[async_trait]
impl Extractor for StructuredExtractor {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn is_remote(&self) -> bool {
        true
    }

    async fn extract_data(&self, text: &str) -> Result<ExtractionResult, ExtractError> {
        let result = self.extract(text).await?;
        if result.is_empty() {
            return Err(ExtractError::NoDataFound);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pattern_extractor_through_trait() {
        let extractor: Box<dyn Extractor> = Box::new(PatternExtractor::new());

        let result = extractor.extract_data("Traffic is up 25% and sales hit $3M").await.unwrap();

        assert_eq!(extractor.name(), "pattern");
        assert_eq!(result.data_points.len(), 2);
        assert_eq!(result.data_points[0].value, 3_000_000.0);
        assert_eq!(result.summary, "Found 2 numeric value(s) in the text");
    }

    #[tokio::test]
    async fn test_pattern_extractor_no_data() {
        let err = PatternExtractor::new().extract_data("no numbers here").await.unwrap_err();
        assert!(matches!(err, ExtractError::NoDataFound));
    }
}
