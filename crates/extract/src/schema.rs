use serde::{Deserialize, Serialize};

/// One quantitative fact pulled out of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unit-expanded value ("45K" is stored as 45000).
    pub value: f64,
    pub label: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
}

impl DataPoint {
    pub fn new(value: f64, label: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            category: category.into(),
            trend: None,
        }
    }

    pub fn with_trend(mut self, trend: impl Into<String>) -> Self {
        self.trend = Some(trend.into());
        self
    }

    /// True when a non-blank trend is attached.
    pub fn is_trending(&self) -> bool {
        self.trend.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Output of one extraction call. Point order is the order the facts were found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub data_points: Vec<DataPoint>,
    pub summary: String,
}

impl ExtractionResult {
    pub fn new(data_points: Vec<DataPoint>, summary: impl Into<String>) -> Self {
        Self {
            data_points,
            summary: summary.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }
}
