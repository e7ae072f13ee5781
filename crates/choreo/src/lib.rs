//! Turns note performances into keyframe streams.
//!
//! Groups of scene objects are bound to ingested tracks. Every note
//! realizes its object's template over a window of frames, and an
//! instrument family decides how those windows become keyframes: sampled
//! every frame on the object itself, flown on pooled proxies, or merged as
//! shifted key sequences.

pub mod channel;
pub mod concurrency;
pub mod frame_range;
pub mod instrument;
pub mod pool;
pub mod processor;
pub mod report;
pub mod scene;
pub mod sink;
pub mod sweep;
pub mod template;
pub mod timebase;

pub use channel::{Axis, ChannelPath};
pub use concurrency::max_concurrency;
pub use frame_range::{compute_frame_ranges, schedule, FrameRange, RangeId, Schedule, SLACK};
pub use instrument::{
    animate_group, build_instrument, EvaluateInstrument, Instrument, KeyframedInstrument,
    ProjectileInstrument, RenderOptions,
};
pub use pool::{Pool, PoolIndex};
pub use processor::{AnimationProcessor, LocationMode};
pub use report::AnimationReport;
pub use scene::{AnimatedObject, InstrumentFamily, ObjectGroup, Scene};
pub use sink::{KeyframeSink, OffsetSink, RecordingSink, SinkEvent};
pub use sweep::{sweep, SweepHandler, SweepStats};
pub use template::{AnimationTemplate, ChannelCurve};
pub use timebase::FrameRate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("projectile pool for group '{group}' exhausted ({capacity} proxies)")]
    PoolExhausted { group: String, capacity: usize },

    #[error("pool '{pool}' entry {index} is not checked out")]
    NotCheckedOut { pool: String, index: usize },

    #[error("range {range} of group '{group}' retired without a proxy")]
    RangeNotAdmitted { group: String, range: usize },

    #[error("object '{object}' in group '{group}' maps note {note} more than once")]
    DuplicateMapping { group: String, object: String, note: u8 },

    #[error("group '{0}' maps no notes")]
    EmptyGroup(String),

    #[error("unknown channel path '{0}'")]
    UnknownChannel(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Curve(#[from] keycurves::CurveError),

    #[error(transparent)]
    Midi(#[from] midi_perform::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
