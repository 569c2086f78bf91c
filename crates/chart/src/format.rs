use extract::DataPoint;
use serde::{Deserialize, Serialize};

/// Fraction digits kept when formatting a value for display.
const MAX_FRACTION_DIGITS: usize = 3;

/// When a `%` is appended to a displayed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PercentSuffix {
    /// Points whose category is "Percentage" (or "Percent").
    #[default]
    Category,
    /// Any value below 100, whatever it measures.
    BelowHundred,
    Never,
}

impl PercentSuffix {
    pub fn applies(self, point: &DataPoint) -> bool {
        match self {
            Self::Category => {
                let category = point.category.trim();
                category.eq_ignore_ascii_case("percentage") || category.eq_ignore_ascii_case("percent")
            }
            Self::BelowHundred => point.value < 100.0,
            Self::Never => false,
        }
    }
}

/// Format with thousands separators and at most three fraction digits,
/// trailing zeros dropped: `45000` -> `45,000`, `1234.5678` -> `1,234.568`.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let mut out = String::new();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Display string for a point's value, suffix included
pub fn display_value(point: &DataPoint, rule: PercentSuffix) -> String {
    let mut text = format_grouped(point.value);
    if rule.applies(point) {
        text.push('%');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(12.0), "12");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1000.0), "1,000");
        assert_eq!(format_grouped(45000.0), "45,000");
        assert_eq!(format_grouped(1_500_000.0), "1,500,000");
        assert_eq!(format_grouped(2e9), "2,000,000,000");
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(format_grouped(12.5), "12.5");
        assert_eq!(format_grouped(1234.5678), "1,234.568");
        assert_eq!(format_grouped(0.0001), "0");
        assert_eq!(format_grouped(2.9999), "3");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(format_grouped(-1234.5), "-1,234.5");
        assert_eq!(format_grouped(-0.0001), "0");
    }

    #[test]
    fn test_percent_by_category() {
        let pct = DataPoint::new(12.0, "Growth", "Percentage");
        let count = DataPoint::new(42.0, "Items", "Inventory");

        assert_eq!(display_value(&pct, PercentSuffix::Category), "12%");
        assert_eq!(display_value(&count, PercentSuffix::Category), "42");
    }

    #[test]
    fn test_percent_below_hundred() {
        let count = DataPoint::new(42.0, "Items", "Inventory");
        let sales = DataPoint::new(45000.0, "Q3 Sales", "Sales");

        assert_eq!(display_value(&count, PercentSuffix::BelowHundred), "42%");
        assert_eq!(display_value(&sales, PercentSuffix::BelowHundred), "45,000");
        assert_eq!(display_value(&count, PercentSuffix::Never), "42");
    }
}
