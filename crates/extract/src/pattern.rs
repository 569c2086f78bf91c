use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::schema::DataPoint;

/// `$` amount with an optional uppercase magnitude suffix, e.g. `$45K`, `$1.2B`
static CURRENCY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([0-9]+(?:\.[0-9]+)?)([KMB])?").unwrap());
/// Decimal followed by a percent sign, e.g. `12%`, `3.5%`
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)%").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Currency,
    Percent,
}

struct NumberPattern {
    kind: PatternKind,
    regex: &'static Lazy<Regex>,
    category: &'static str,
}

/// Evaluated in this order.
static PATTERNS: [NumberPattern; 2] = [
    NumberPattern {
        kind: PatternKind::Currency,
        regex: &CURRENCY,
        category: "Sales",
    },
    NumberPattern {
        kind: PatternKind::Percent,
        regex: &PERCENT,
        category: "Percentage",
    },
];

/// Keyword -> label overrides. First trigger present in the text wins.
/// A trigger bound to a pattern kind only applies to matches of that kind.
const LABEL_TRIGGERS: [(&str, Option<PatternKind>, &str); 3] = [
    ("sales", Some(PatternKind::Currency), "Q3 Sales"),
    ("quantum", None, "Quantum Series"),
    ("traffic", None, "Traffic Growth"),
];

const RISE_WORDS: [&str; 9] = ["up", "grew", "grow", "increas", "rose", "rise", "gain", "jump", "climb"];
const FALL_WORDS: [&str; 8] = ["down", "fell", "fall", "declin", "drop", "decreas", "shrank", "lost"];

/// Order in which matches from different patterns are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// All currency matches in text order, then all percent matches.
    #[default]
    Pattern,
    /// One merged left-to-right pass across every pattern.
    Text,
}

/// Regex-based extractor for currency and percentage mentions.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    scan_order: ScanOrder,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_order(scan_order: ScanOrder) -> Self {
        Self { scan_order }
    }

    /// Scan `text` for numeric mentions. Returns an empty list when nothing matches.
    pub fn extract(&self, text: &str) -> Vec<DataPoint> {
        let lower = text.to_lowercase();
        let mut found: Vec<(usize, DataPoint)> = Vec::new();

        for pattern in &PATTERNS {
            let label = infer_label(&lower, pattern);

            for caps in pattern.regex.captures_iter(text) {
                let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let suffix = caps.get(2).map(|m| m.as_str());

                let Some(value) = parse_value(number.as_str(), suffix) else {
                    tracing::debug!(token = whole.as_str(), "skipping unparseable numeric token");
                    continue;
                };

                let mut point = DataPoint::new(value, label, pattern.category);
                if let Some(trend) = infer_trend(clause_around(text, whole.start(), whole.end())) {
                    point = point.with_trend(trend);
                }
                found.push((whole.start(), point));
            }
        }

        if self.scan_order == ScanOrder::Text {
            // stable: overlapping tokens keep pattern priority
            found.sort_by_key(|(start, _)| *start);
        }

        found.into_iter().map(|(_, point)| point).collect()
    }
}

/// Parse a decimal token and expand an optional `K`/`M`/`B` suffix
fn parse_value(number: &str, suffix: Option<&str>) -> Option<f64> {
    let base: f64 = number.parse().ok()?;
    let multiplier = match suffix {
        Some("K") => 1e3,
        Some("M") => 1e6,
        Some("B") => 1e9,
        _ => 1.0,
    };
    Some(base * multiplier).filter(|v| v.is_finite())
}

fn infer_label(lower_text: &str, pattern: &NumberPattern) -> &'static str {
    LABEL_TRIGGERS
        .iter()
        .find(|(keyword, kind, _)| {
            kind.is_none_or(|k| k == pattern.kind) && lower_text.contains(keyword)
        })
        .map(|(_, _, label)| *label)
        .unwrap_or(pattern.category)
}

/// The clause containing `start..end`, bounded by sentence punctuation or newlines.
/// A `.` only ends a clause when it is not part of a decimal.
fn clause_around(text: &str, start: usize, end: usize) -> &str {
    let bytes = text.as_bytes();
    let is_boundary = |i: usize| match bytes[i] {
        b'!' | b'?' | b';' | b'\n' => true,
        b'.' => !(i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit()),
        _ => false,
    };

    let clause_start = (0..start).rev().find(|&i| is_boundary(i)).map_or(0, |i| i + 1);
    let clause_end = (end..bytes.len()).find(|&i| is_boundary(i)).unwrap_or(bytes.len());

    // boundaries are ASCII so both indices sit on char boundaries
    &text[clause_start..clause_end]
}

fn infer_trend(clause: &str) -> Option<&'static str> {
    clause
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .find_map(|word| {
            let matches = |stem: &&str| {
                if stem.len() <= 2 {
                    word == **stem
                } else {
                    word.starts_with(*stem)
                }
            };
            if RISE_WORDS.iter().any(matches) {
                Some("increasing")
            } else if FALL_WORDS.iter().any(matches) {
                Some("decreasing")
            } else {
                None
            }
        })
}
