use crate::scene::InstrumentFamily;
use serde::Serialize;

/// Summary of one group's run over one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationReport {
    pub group: String,
    pub track: String,
    pub family: InstrumentFamily,
    /// `None` when no note was scheduled
    pub first_frame: Option<i64>,
    pub last_frame: Option<i64>,
    pub ranges: usize,
    pub skipped_notes: usize,
    /// Proxies created, for pooled families
    pub pool_size: Option<usize>,
    pub peak_active: usize,
    pub keyframes: usize,
    pub visibility_events: usize,
}

impl AnimationReport {
    pub fn is_empty(&self) -> bool {
        self.ranges == 0
    }
}
