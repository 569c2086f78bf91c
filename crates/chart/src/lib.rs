pub mod builder;
pub mod error;
pub mod format;
pub mod spec;

pub use builder::{ChartSpecBuilder, DEFAULT_STAGGER_MS};
pub use error::InvalidInputError;
pub use format::{PercentSuffix, format_grouped};
pub use spec::{Animation, BarGeometry, ChartEntry, ChartKind, ChartSpec, Geometry, Point, SliceGeometry};
