use extract::DataPoint;
use indexmap::IndexMap;
use serde::Serialize;

/// A data point that carries a trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCallout {
    pub label: String,
    pub trend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Observations derived from a set of data points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    /// Points with a trend, in extraction order
    pub trending: Vec<TrendCallout>,
    /// Remaining points grouped by category, in order of first occurrence
    pub categories: Vec<CategoryCount>,
}

impl Insights {
    pub fn is_empty(&self) -> bool {
        self.trending.is_empty() && self.categories.is_empty()
    }

    /// Line-oriented report; empty when there is nothing to say.
    pub fn to_text(&self) -> String {
        let mut sections = Vec::new();

        if !self.trending.is_empty() {
            let mut section = format!("Trending metrics ({}):\n", self.trending.len());
            for callout in &self.trending {
                section.push_str(&format!("- {} is {}\n", callout.label, callout.trend));
            }
            sections.push(section);
        }

        if !self.categories.is_empty() {
            let mut section = format!("Categories ({}):\n", self.categories.len());
            for group in &self.categories {
                let noun = if group.count == 1 { "data point" } else { "data points" };
                section.push_str(&format!("- {}: {} {}\n", group.category, group.count, noun));
            }
            sections.push(section);
        }

        sections.join("\n")
    }
}

/// Stateless summarizer over canonical data points.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightSummarizer;

impl InsightSummarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, data_points: &[DataPoint]) -> Insights {
        let mut trending = Vec::new();
        let mut groups: IndexMap<&str, usize> = IndexMap::new();

        for point in data_points {
            match point.trend.as_deref() {
                Some(trend) if point.is_trending() => trending.push(TrendCallout {
                    label: point.label.clone(),
                    trend: trend.trim().to_string(),
                }),
                _ => *groups.entry(point.category.as_str()).or_insert(0) += 1,
            }
        }

        Insights {
            trending,
            categories: groups
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category: category.to_string(),
                    count,
                })
                .collect(),
        }
    }

    pub fn summarize(&self, data_points: &[DataPoint]) -> String {
        self.analyze(data_points).to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str, category: &str) -> DataPoint {
        DataPoint::new(1.0, label, category)
    }

    #[test]
    fn test_empty_input() {
        let summarizer = InsightSummarizer::new();

        assert!(summarizer.analyze(&[]).is_empty());
        assert_eq!(summarizer.summarize(&[]), "");
    }

    #[test]
    fn test_categories_in_first_occurrence_order() {
        let points = vec![point("b1", "B"), point("a1", "A"), point("b2", "B"), point("a2", "A")];

        let insights = InsightSummarizer::new().analyze(&points);
        let order: Vec<&str> = insights.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);

        let text = InsightSummarizer::new().summarize(&points);
        let b = text.find("- B:").unwrap();
        let a = text.find("- A:").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_report_layout() {
        let points = vec![
            DataPoint::new(45000.0, "Q3 Sales", "Sales").with_trend("increasing"),
            point("Visitors", "Traffic"),
            DataPoint::new(3.0, "Churn", "Percentage").with_trend("decreasing"),
            point("Signups", "Traffic"),
            point("Margin", "Percentage"),
        ];

        let text = InsightSummarizer::new().summarize(&points);

        assert_eq!(
            text,
            "Trending metrics (2):\n\
             - Q3 Sales is increasing\n\
             - Churn is decreasing\n\
             \n\
             Categories (2):\n\
             - Traffic: 2 data points\n\
             - Percentage: 1 data point\n"
        );
    }

    #[test]
    fn test_blank_trend_is_not_trending() {
        let points = vec![DataPoint::new(5.0, "Users", "Growth").with_trend("  ")];

        let insights = InsightSummarizer::new().analyze(&points);

        assert!(insights.trending.is_empty());
        assert_eq!(insights.categories, vec![CategoryCount { category: "Growth".into(), count: 1 }]);
    }

    #[test]
    fn test_serializes_for_api() {
        let points = vec![DataPoint::new(5.0, "Users", "Growth").with_trend("increasing")];

        let json = serde_json::to_value(InsightSummarizer::new().analyze(&points)).unwrap();

        assert_eq!(json["trending"][0]["label"], "Users");
        assert_eq!(json["categories"].as_array().unwrap().len(), 0);
    }
}
