pub mod combine;
pub mod keyframe;
pub mod overlap;

pub use combine::{CombinePolicy, Combiner};
pub use keyframe::{evaluate, interpolate, interval_for, shifted, span, Keyframe};
pub use overlap::{find_overlap, overlap_region, overlap_window};

/// Errors from keyframe sequence algebra.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("incoming sequence starts at frame {next_start} but the committed one starts later, at {inserted_start}")]
    TimeReversed { inserted_start: f64, next_start: f64 },

    #[error("unknown combination policy '{0}'")]
    UnknownPolicy(String),
}

pub type Result<T> = std::result::Result<T, CurveError>;
