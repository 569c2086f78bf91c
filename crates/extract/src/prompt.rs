use serde_json::{Value, json};

/// Name of the function the service is forced to call.
pub const FUNCTION_NAME: &str = "record_data_points";

pub fn system_instruction() -> &'static str {
    r#"Extract numerical data points from the text and format them as JSON. Focus on key metrics, trends, and patterns.

RULES:
- Call record_data_points exactly once
- value is a plain number: expand suffixes (45K -> 45000, 1.2M -> 1200000), drop currency symbols and percent signs
- label is a short name for the metric, taken from the surrounding words
- category classifies the metric, e.g. Sales, Revenue, Percentage, Growth, Users
- trend is "increasing" or "decreasing" when the text says so, otherwise omit it
- Keep data points in the order they appear in the text
- summary is one sentence describing what the numbers show"#
}

/// Parameter schema for the extraction function.
///
/// `dataPoints` and `summary` are required at the top level; `value`,
/// `label` and `category` are required per entry.
pub fn data_points_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dataPoints": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "number" },
                        "label": { "type": "string" },
                        "category": { "type": "string" },
                        "trend": { "type": "string" }
                    },
                    "required": ["value", "label", "category"]
                }
            },
            "summary": { "type": "string" }
        },
        "required": ["dataPoints", "summary"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_required_fields() {
        let schema = data_points_schema();

        assert_eq!(schema["required"], json!(["dataPoints", "summary"]));
        assert_eq!(
            schema["properties"]["dataPoints"]["items"]["required"],
            json!(["value", "label", "category"])
        );
    }
}
