use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidInputError;

pub const PIE_PALETTE: [&str; 3] = ["#60a5fa", "#4ade80", "#f472b6"];
pub const BAR_PALETTE: [&str; 2] = ["#60a5fa", "#4ade80"];

/// Side of the square canvas slice coordinates live on.
pub const CANVAS_SIZE: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Pie,
    Bar,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pie => "pie",
            Self::Bar => "bar",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pie" => Ok(Self::Pie),
            "bar" => Ok(Self::Bar),
            other => Err(InvalidInputError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Pie slice geometry. Angles are in degrees, clockwise from the +x axis,
/// before the chart-level rotation is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceGeometry {
    pub start_angle_deg: f64,
    pub sweep_angle_deg: f64,
    pub large_arc_flag: bool,
    pub start_point: Point,
    pub end_point: Point,
    /// SVG path data for the slice on the 100x100 canvas
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarGeometry {
    /// Height relative to the largest value, in [0, 1]
    pub height_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Geometry {
    Slice(SliceGeometry),
    Bar(BarGeometry),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    pub value: f64,
    pub label: String,
    pub category: String,
    pub color_index: usize,
    pub color: String,
    /// Formatted value, e.g. `45,000` or `12%`
    pub display_value: String,
    /// `label: display_value`
    pub legend_text: String,
    pub animation_delay_ms: u64,
    #[serde(flatten)]
    pub geometry: Geometry,
}

impl ChartEntry {
    pub fn slice(&self) -> Option<&SliceGeometry> {
        match &self.geometry {
            Geometry::Slice(slice) => Some(slice),
            Geometry::Bar(_) => None,
        }
    }

    pub fn bar(&self) -> Option<&BarGeometry> {
        match &self.geometry {
            Geometry::Bar(bar) => Some(bar),
            Geometry::Slice(_) => None,
        }
    }
}

/// How the renderer reveals entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    /// Delay added per entry index
    pub stagger_ms: u64,
    /// Length of each entry's reveal
    pub duration_ms: u64,
    pub easing: String,
    /// Pie slices scale in from here; bars grow from their base
    pub transform_origin: String,
}

/// Fully resolved chart description handed to a renderer.
///
/// Entries are drawn in order; entry `i` starts animating after
/// `i * animation.stagger_ms`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Rotation applied to the whole drawing at render time
    pub rotation_deg: f64,
    pub palette: Vec<String>,
    pub animation: Animation,
    pub entries: Vec<ChartEntry>,
}

impl ChartSpec {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
