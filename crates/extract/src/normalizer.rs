use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::ExtractionError;
use crate::schema::{DataPoint, ExtractionResult};

static EDGE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s.,!?;:'\x22]+|[\s.,!?;:'\x22]+$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub struct DataPointNormalizer {
    /// Maps lowercase category key -> first spelling seen
    categories: HashMap<String, String>,
}

impl DataPointNormalizer {
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    /// Clean up free text: trim edge punctuation and collapse inner whitespace
    pub fn clean_text(text: &str) -> String {
        let collapsed = WHITESPACE.replace_all(text, " ");
        EDGE_PUNCTUATION.replace_all(&collapsed, "").to_string()
    }

    /// Resolve a category to its canonical spelling.
    ///
    /// "sales", "Sales" and " SALES " all map to whichever form was seen first,
    /// so downstream grouping by category does not split on case.
    pub fn canonical_category(&mut self, category: &str) -> String {
        let cleaned = Self::clean_text(category);
        let key = cleaned.to_lowercase();

        if let Some(canonical) = self.categories.get(&key) {
            return canonical.clone();
        }

        self.categories.insert(key, cleaned.clone());
        cleaned
    }

    /// Normalize one point in place.
    ///
    /// The value must be finite and the category non-empty. An empty label
    /// falls back to the category name; a blank trend is dropped.
    pub fn normalize_point(&mut self, index: usize, point: &mut DataPoint) -> Result<(), ExtractionError> {
        if !point.value.is_finite() {
            return Err(ExtractionError::InvalidPoint {
                index,
                reason: format!("value {} is not finite", point.value),
            });
        }

        let category = self.canonical_category(&point.category);
        if category.is_empty() {
            return Err(ExtractionError::InvalidPoint {
                index,
                reason: "category is empty".to_string(),
            });
        }

        let label = Self::clean_text(&point.label);
        point.label = if label.is_empty() { category.clone() } else { label };
        point.category = category;

        point.trend = point
            .trend
            .take()
            .map(|t| WHITESPACE.replace_all(t.trim(), " ").to_string())
            .filter(|t| !t.is_empty());

        Ok(())
    }

    /// Normalize every point of a result, keeping their order
    pub fn normalize_result(&mut self, result: &mut ExtractionResult) -> Result<(), ExtractionError> {
        for (index, point) in result.data_points.iter_mut().enumerate() {
            self.normalize_point(index, point)?;
        }
        result.summary = result.summary.trim().to_string();
        Ok(())
    }

    /// Get the mapping of all seen categories
    pub fn get_categories(&self) -> &HashMap<String, String> {
        &self.categories
    }
}

impl Default for DataPointNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(DataPointNormalizer::clean_text("  Q3   Sales. "), "Q3 Sales");
        assert_eq!(DataPointNormalizer::clean_text("\"Traffic\"!"), "Traffic");
        assert_eq!(DataPointNormalizer::clean_text("..."), "");
    }

    #[test]
    fn test_category_alias_resolution() {
        let mut normalizer = DataPointNormalizer::new();

        let c1 = normalizer.canonical_category("Sales");
        let c2 = normalizer.canonical_category(" SALES ");
        let c3 = normalizer.canonical_category("sales.");

        assert_eq!(c1, "Sales");
        assert_eq!(c2, "Sales");
        assert_eq!(c3, "Sales");
        assert_eq!(normalizer.get_categories().len(), 1);
    }

    #[test]
    fn test_empty_label_falls_back_to_category() {
        let mut normalizer = DataPointNormalizer::new();
        let mut point = DataPoint::new(12.0, "  ", "Percentage").with_trend("   ");

        normalizer.normalize_point(0, &mut point).unwrap();

        assert_eq!(point.label, "Percentage");
        assert_eq!(point.trend, None);
    }

    #[test]
    fn test_rejects_empty_category() {
        let mut normalizer = DataPointNormalizer::new();
        let mut point = DataPoint::new(1.0, "Visitors", " ");

        let err = normalizer.normalize_point(3, &mut point).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPoint { index: 3, .. }));
    }

    #[test]
    fn test_rejects_non_finite_value() {
        let mut normalizer = DataPointNormalizer::new();
        let mut point = DataPoint::new(f64::NAN, "Visitors", "Traffic");

        assert!(normalizer.normalize_point(0, &mut point).is_err());
    }

    #[test]
    fn test_normalize_result_keeps_order() {
        let mut normalizer = DataPointNormalizer::new();
        let mut result = ExtractionResult::new(
            vec![
                DataPoint::new(3.0, "c", "growth"),
                DataPoint::new(1.0, "a", "Growth"),
                DataPoint::new(2.0, "b", "Revenue"),
            ],
            "  three metrics ",
        );

        normalizer.normalize_result(&mut result).unwrap();

        let labels: Vec<&str> = result.data_points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
        assert_eq!(result.data_points[1].category, "growth");
        assert_eq!(result.summary, "three metrics");
    }
}
