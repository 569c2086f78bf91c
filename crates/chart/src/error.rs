use thiserror::Error;

/// Input a chart cannot be built from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("no data points to chart")]
    NoDataPoints,

    #[error("pie chart needs a nonzero total, values sum to zero")]
    ZeroTotal,

    #[error("pie slice {index} has negative value {value}")]
    Negative { index: usize, value: f64 },

    #[error("data point {index} has non-finite value {value}")]
    NonFinite { index: usize, value: f64 },

    #[error("unknown chart type '{0}', expected 'pie' or 'bar'")]
    UnknownKind(String),
}
