//! Error type shared by every stage of the layout pipeline.
//!
//! All variants are fatal for the current layout request. A line that is too
//! narrow for its content is not an error; it is reported through the
//! `overflow` flag of the spacing result instead.

/// Everything that can make a layout request fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("voice {voice}: entity {index} has non-positive duration {duration}")]
    NonPositiveDuration {
        voice: usize,
        index: usize,
        duration: String,
    },

    #[error("voice {voice}: entity {index} has non-finite duration {duration}")]
    NonFiniteDuration {
        voice: usize,
        index: usize,
        duration: String,
    },

    #[error("voice {voice}: interval {start}..={end} does not fit its {len} entities")]
    SpanOutOfRange {
        voice: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("interval {start}..={end} does not fit the {len} slices of the line")]
    IntervalOutOfRange { start: usize, end: usize, len: usize },

    #[error("cannot space an empty slice list")]
    EmptySlices,

    #[error("target width must be a non-negative number, got {0}")]
    InvalidTargetWidth(f64),

    #[error("{slices} slices but {extents} slice extents")]
    ExtentMismatch { slices: usize, extents: usize },

    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),

    #[error("invalid render config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
