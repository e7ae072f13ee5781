//! Single forward pass over frames.
//!
//! Every frame runs in three steps: retire the ranges whose end has passed,
//! admit the ranges whose start has arrived, then hand the active set to
//! the handler. Retiring before admitting lets an entry vacated on a frame
//! be reissued on that same frame.

use crate::frame_range::FrameRange;
use crate::Result;

pub trait SweepHandler {
    /// `range` ended before `frame`.
    fn on_frame_exit(&mut self, frame: i64, range: &FrameRange) -> Result<()>;

    /// `range` starts on `frame`.
    fn on_frame_enter(&mut self, frame: i64, range: &FrameRange) -> Result<()>;

    /// Called once per frame after retirement and admission.
    fn on_frame(&mut self, frame: i64, active: &[FrameRange]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub first_frame: i64,
    pub last_frame: i64,
    pub frames: usize,
    pub peak_active: usize,
}

/// Sweep every frame from the earliest start to the latest end.
///
/// Ranges still active after the last frame are retired on the frame after it.
pub fn sweep<H>(ranges: &[FrameRange], handler: &mut H) -> Result<SweepStats>
where
    H: SweepHandler + ?Sized,
{
    let (Some(first), Some(last)) = (
        ranges.iter().map(|r| r.start).min(),
        ranges.iter().map(|r| r.end).max(),
    ) else {
        return Ok(SweepStats::default());
    };

    // descending by start so the next range to admit is at the tail
    let mut pending: Vec<&FrameRange> = ranges.iter().collect();
    pending.sort_by(|a, b| b.start.cmp(&a.start).then(b.id.cmp(&a.id)));

    let mut active: Vec<FrameRange> = Vec::new();
    let mut stats = SweepStats {
        first_frame: first,
        last_frame: last,
        ..Default::default()
    };

    for frame in first..=last {
        let mut i = 0;
        while i < active.len() {
            if active[i].end < frame {
                let range = active.remove(i);
                handler.on_frame_exit(frame, &range)?;
            } else {
                i += 1;
            }
        }

        while pending.last().is_some_and(|r| r.start <= frame) {
            if let Some(range) = pending.pop() {
                handler.on_frame_enter(frame, range)?;
                active.push(range.clone());
            }
        }

        stats.peak_active = stats.peak_active.max(active.len());
        handler.on_frame(frame, &active)?;
        stats.frames += 1;
    }

    for range in active.drain(..) {
        handler.on_frame_exit(last + 1, &range)?;
    }

    tracing::trace!(first, last, peak = stats.peak_active, "sweep finished");
    Ok(stats)
}
