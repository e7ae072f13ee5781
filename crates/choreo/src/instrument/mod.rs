//! Instrument families.
//!
//! Every family implements [`Instrument`]; the provided [`Instrument::animate`]
//! drives them all through the same schedule, sweep, and commit cycle.

mod evaluate;
mod keyframed;
mod projectile;

pub use evaluate::EvaluateInstrument;
pub use keyframed::KeyframedInstrument;
pub use projectile::ProjectileInstrument;

use crate::frame_range::{schedule, FrameRange, Schedule};
use crate::report::AnimationReport;
use crate::scene::{InstrumentFamily, ObjectGroup};
use crate::sink::{CountingSink, KeyframeSink};
use crate::sweep::{sweep, SweepHandler};
use crate::timebase::FrameRate;
use crate::Result;
use keycurves::Combiner;
use midi_perform::{DiagnosticSink, Track};

/// Settings shared by every group in a render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderOptions {
    pub rate: FrameRate,
    /// Used by keyframed groups that do not name their own policy
    pub combiner: Combiner,
}

pub trait Instrument {
    fn group(&self) -> &ObjectGroup;

    fn rate(&self) -> FrameRate;

    fn compute_frame_ranges(&self, track: &Track, diagnostics: &mut dyn DiagnosticSink) -> Schedule {
        schedule(track, self.group(), self.rate(), diagnostics)
    }

    /// Reset state and emit anything needed before the first frame.
    fn pre_animate(&mut self, ranges: &[FrameRange], sink: &mut dyn KeyframeSink) -> Result<()>;

    fn admit(&mut self, _frame: i64, _range: &FrameRange, _sink: &mut dyn KeyframeSink) -> Result<()> {
        Ok(())
    }

    fn retire(&mut self, _frame: i64, _range: &FrameRange, _sink: &mut dyn KeyframeSink) -> Result<()> {
        Ok(())
    }

    /// Gather this frame's contributions from every active range.
    fn accumulate(&mut self, frame: i64, active: &[FrameRange]) -> Result<()>;

    /// Write this frame's accumulated values.
    fn commit(&mut self, frame: i64, sink: &mut dyn KeyframeSink) -> Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self, _sink: &mut dyn KeyframeSink) -> Result<()> {
        Ok(())
    }

    fn pool_size(&self) -> Option<usize> {
        None
    }

    fn animate(
        &mut self,
        track: &Track,
        sink: &mut dyn KeyframeSink,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<AnimationReport> {
        let schedule = self.compute_frame_ranges(track, diagnostics);
        let mut counting = CountingSink::new(sink);

        self.pre_animate(&schedule.ranges, &mut counting)?;
        let stats = sweep(
            &schedule.ranges,
            &mut Driver {
                instrument: self,
                sink: &mut counting,
            },
        )?;
        self.finish(&mut counting)?;

        let report = AnimationReport {
            group: self.group().name.clone(),
            family: self.group().family,
            track: track.name.clone(),
            first_frame: schedule.first_frame(),
            last_frame: schedule.last_frame(),
            ranges: schedule.ranges.len(),
            skipped_notes: schedule.skipped_notes,
            pool_size: self.pool_size(),
            peak_active: stats.peak_active,
            keyframes: counting.keyframes,
            visibility_events: counting.visibility,
        };
        tracing::info!(
            group = %report.group,
            track = %report.track,
            ranges = report.ranges,
            keyframes = report.keyframes,
            "group animated"
        );
        Ok(report)
    }
}

/// Adapts an instrument to the sweep callbacks.
struct Driver<'a, I: ?Sized> {
    instrument: &'a mut I,
    sink: &'a mut dyn KeyframeSink,
}

impl<I: Instrument + ?Sized> SweepHandler for Driver<'_, I> {
    fn on_frame_exit(&mut self, frame: i64, range: &FrameRange) -> Result<()> {
        self.instrument.retire(frame, range, self.sink)
    }

    fn on_frame_enter(&mut self, frame: i64, range: &FrameRange) -> Result<()> {
        self.instrument.admit(frame, range, self.sink)
    }

    fn on_frame(&mut self, frame: i64, active: &[FrameRange]) -> Result<()> {
        self.instrument.accumulate(frame, active)?;
        self.instrument.commit(frame, self.sink)
    }
}

/// The instrument for a group's family.
pub fn build_instrument<'g>(group: &'g ObjectGroup, options: &RenderOptions) -> Box<dyn Instrument + 'g> {
    match group.family {
        InstrumentFamily::Evaluate => Box::new(EvaluateInstrument::new(group, options.rate)),
        InstrumentFamily::Projectile => Box::new(ProjectileInstrument::new(group, options.rate)),
        InstrumentFamily::Keyframed => {
            let mut combiner = options.combiner;
            if let Some(policy) = group.combine {
                combiner.policy = policy;
            }
            Box::new(KeyframedInstrument::new(group, options.rate, combiner))
        }
    }
}

/// Validate a group and animate it from one track.
pub fn animate_group(
    group: &ObjectGroup,
    track: &Track,
    sink: &mut dyn KeyframeSink,
    options: &RenderOptions,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<AnimationReport> {
    group.validate()?;
    build_instrument(group, options).animate(track, sink, diagnostics)
}
