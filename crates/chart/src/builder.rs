use extract::DataPoint;
use tracing::debug;

use crate::error::InvalidInputError;
use crate::format::{PercentSuffix, display_value};
use crate::spec::{
    Animation, BAR_PALETTE, BarGeometry, CANVAS_SIZE, ChartEntry, ChartKind, ChartSpec, Geometry,
    PIE_PALETTE, Point, SliceGeometry,
};

pub const DEFAULT_STAGGER_MS: u64 = 200;

const PIE_DURATION_MS: u64 = 500;
const BAR_DURATION_MS: u64 = 1000;
/// Turns the first slice to start at twelve o'clock
const PIE_ROTATION_DEG: f64 = -90.0;
const FULL_CIRCLE_EPSILON: f64 = 1e-9;

/// Maps canonical data points to a pie or bar [`ChartSpec`].
///
/// Output depends only on the points (in order) and the builder settings.
#[derive(Debug, Clone)]
pub struct ChartSpecBuilder {
    stagger_ms: u64,
    percent_suffix: PercentSuffix,
}

impl Default for ChartSpecBuilder {
    fn default() -> Self {
        Self {
            stagger_ms: DEFAULT_STAGGER_MS,
            percent_suffix: PercentSuffix::default(),
        }
    }
}

impl ChartSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stagger_ms(mut self, stagger_ms: u64) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn with_percent_suffix(mut self, percent_suffix: PercentSuffix) -> Self {
        self.percent_suffix = percent_suffix;
        self
    }

    pub fn build(&self, data_points: &[DataPoint], kind: ChartKind) -> Result<ChartSpec, InvalidInputError> {
        validate(data_points)?;

        let spec = match kind {
            ChartKind::Pie => self.build_pie(data_points)?,
            ChartKind::Bar => self.build_bar(data_points),
        };

        debug!(kind = %kind, entries = spec.entries.len(), "chart spec built");
        Ok(spec)
    }

    fn build_pie(&self, data_points: &[DataPoint]) -> Result<ChartSpec, InvalidInputError> {
        if let Some((index, point)) = data_points.iter().enumerate().find(|(_, p)| p.value < 0.0) {
            return Err(InvalidInputError::Negative {
                index,
                value: point.value,
            });
        }

        // shares are taken of values scaled into [0, 1] so the sum cannot overflow
        let largest = data_points.iter().map(|p| p.value).fold(0.0, f64::max);
        if largest == 0.0 {
            return Err(InvalidInputError::ZeroTotal);
        }
        let scaled: Vec<f64> = data_points.iter().map(|p| p.value / largest).collect();
        let total: f64 = scaled.iter().sum();

        let sweeps: Vec<f64> = scaled.iter().map(|share| share / total * 360.0).collect();

        // start angle of slice i = sum of sweeps before it
        let starts: Vec<f64> = sweeps
            .iter()
            .scan(0.0, |acc, sweep| {
                let start = *acc;
                *acc += sweep;
                Some(start)
            })
            .collect();

        let entries = data_points
            .iter()
            .zip(starts.iter().zip(&sweeps))
            .enumerate()
            .map(|(index, (point, (&start, &sweep)))| {
                let slice = slice_geometry(start, sweep);
                self.entry(index, point, &PIE_PALETTE, Geometry::Slice(slice))
            })
            .collect();

        Ok(ChartSpec {
            kind: ChartKind::Pie,
            rotation_deg: PIE_ROTATION_DEG,
            palette: palette(&PIE_PALETTE),
            animation: Animation {
                stagger_ms: self.stagger_ms,
                duration_ms: PIE_DURATION_MS,
                easing: "power1.out".to_string(),
                transform_origin: "50% 50%".to_string(),
            },
            entries,
        })
    }

    fn build_bar(&self, data_points: &[DataPoint]) -> ChartSpec {
        let max = data_points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);

        let entries = data_points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let height_fraction = if max > 0.0 {
                    (point.value / max).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.entry(index, point, &BAR_PALETTE, Geometry::Bar(BarGeometry { height_fraction }))
            })
            .collect();

        ChartSpec {
            kind: ChartKind::Bar,
            rotation_deg: 0.0,
            palette: palette(&BAR_PALETTE),
            animation: Animation {
                stagger_ms: self.stagger_ms,
                duration_ms: BAR_DURATION_MS,
                easing: "power2.out".to_string(),
                transform_origin: "50% 100%".to_string(),
            },
            entries,
        }
    }

    fn entry(&self, index: usize, point: &DataPoint, palette: &[&str], geometry: Geometry) -> ChartEntry {
        let color_index = index % palette.len();
        let display = display_value(point, self.percent_suffix);

        ChartEntry {
            value: point.value,
            label: point.label.clone(),
            category: point.category.clone(),
            color_index,
            color: palette[color_index].to_string(),
            legend_text: format!("{}: {}", point.label, display),
            display_value: display,
            animation_delay_ms: index as u64 * self.stagger_ms,
            geometry,
        }
    }
}

fn validate(data_points: &[DataPoint]) -> Result<(), InvalidInputError> {
    if data_points.is_empty() {
        return Err(InvalidInputError::NoDataPoints);
    }
    if let Some((index, point)) = data_points.iter().enumerate().find(|(_, p)| !p.value.is_finite()) {
        return Err(InvalidInputError::NonFinite {
            index,
            value: point.value,
        });
    }
    Ok(())
}

fn palette(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|c| c.to_string()).collect()
}

/// Point on the canvas circle for an angle in degrees
pub fn point_at_angle(angle_deg: f64) -> Point {
    let radius = CANVAS_SIZE / 2.0;
    let radians = angle_deg.to_radians();
    Point {
        x: radius + radius * radians.cos(),
        y: radius + radius * radians.sin(),
    }
}

fn slice_geometry(start: f64, sweep: f64) -> SliceGeometry {
    let start_point = point_at_angle(start);
    let end_point = point_at_angle(start + sweep);
    let large_arc_flag = sweep > 180.0;

    let path = if sweep >= 360.0 - FULL_CIRCLE_EPSILON {
        // an arc with equal endpoints draws nothing; split the circle in two
        let mid = point_at_angle(start + 180.0);
        format!(
            "M {:.4} {:.4} A 50 50 0 1 1 {:.4} {:.4} A 50 50 0 1 1 {:.4} {:.4} Z",
            start_point.x, start_point.y, mid.x, mid.y, end_point.x, end_point.y
        )
    } else {
        format!(
            "M 50 50 L {:.4} {:.4} A 50 50 0 {} 1 {:.4} {:.4} Z",
            start_point.x,
            start_point.y,
            u8::from(large_arc_flag),
            end_point.x,
            end_point.y
        )
    };

    SliceGeometry {
        start_angle_deg: start,
        sweep_angle_deg: sweep,
        large_arc_flag,
        start_point,
        end_point,
        path,
    }
}
