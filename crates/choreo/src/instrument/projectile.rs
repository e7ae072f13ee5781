use super::Instrument;
use crate::concurrency::max_concurrency;
use crate::frame_range::{FrameRange, RangeId};
use crate::pool::{Pool, PoolIndex};
use crate::processor::{AnimationProcessor, LocationMode};
use crate::scene::ObjectGroup;
use crate::sink::KeyframeSink;
use crate::timebase::FrameRate;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Flies a pooled proxy per note instead of moving the mapped object.
///
/// The pool holds exactly as many proxies as there are ever ranges active
/// at once. A proxy is shown while checked out and hidden otherwise; its
/// location curves are offsets from the mapped object's rest location.
pub struct ProjectileInstrument<'g> {
    group: &'g ObjectGroup,
    rate: FrameRate,
    pool: Pool<String>,
    owners: HashMap<RangeId, PoolIndex>,
    processors: BTreeMap<PoolIndex, AnimationProcessor>,
}

impl<'g> ProjectileInstrument<'g> {
    pub fn new(group: &'g ObjectGroup, rate: FrameRate) -> Self {
        Self {
            group,
            rate,
            pool: Pool::new(group.name.clone(), Vec::new()),
            owners: HashMap::new(),
            processors: BTreeMap::new(),
        }
    }

    pub fn proxy_name(&self, index: usize) -> String {
        format!("{}_{}_{}", self.group.proxy_prefix, self.group.name, index)
    }

    /// Most proxies that were airborne at once in the last run.
    pub fn peak_in_use(&self) -> usize {
        self.pool.peak_in_use()
    }
}

impl Instrument for ProjectileInstrument<'_> {
    fn group(&self) -> &ObjectGroup {
        self.group
    }

    fn rate(&self) -> FrameRate {
        self.rate
    }

    fn pre_animate(&mut self, ranges: &[FrameRange], sink: &mut dyn KeyframeSink) -> Result<()> {
        let size = max_concurrency(ranges.iter().map(FrameRange::bounds));
        let names: Vec<String> = (0..size).map(|i| self.proxy_name(i)).collect();
        self.pool = Pool::new(self.group.name.clone(), names);
        self.owners.clear();
        self.processors.clear();

        if let Some(first) = ranges.iter().map(|r| r.start).min() {
            for name in self.pool.iter() {
                sink.set_visibility(name, (first - 1) as f64, false);
            }
        }
        tracing::debug!(group = %self.group.name, proxies = size, "projectile pool created");
        Ok(())
    }

    fn admit(&mut self, frame: i64, range: &FrameRange, sink: &mut dyn KeyframeSink) -> Result<()> {
        let index = self.pool.checkout(range.id)?;
        let name = self.pool.get(index).cloned().unwrap_or_default();
        let object = &self.group.objects[range.object];

        sink.set_visibility(&name, frame as f64, true);
        self.processors.insert(
            index,
            AnimationProcessor::new(name, LocationMode::Relative, object.location, object.rotation),
        );
        self.owners.insert(range.id, index);
        Ok(())
    }

    fn retire(&mut self, frame: i64, range: &FrameRange, sink: &mut dyn KeyframeSink) -> Result<()> {
        let index = self.owners.remove(&range.id).ok_or_else(|| Error::RangeNotAdmitted {
            group: self.group.name.clone(),
            range: range.id.0,
        })?;
        self.pool.release(index)?;
        if let Some(processor) = self.processors.remove(&index) {
            sink.set_visibility(processor.target(), frame as f64, false);
        }
        Ok(())
    }

    fn accumulate(&mut self, frame: i64, active: &[FrameRange]) -> Result<()> {
        for processor in self.processors.values_mut() {
            processor.begin_frame();
        }
        for range in active {
            let object = &self.group.objects[range.object];
            let processor = self
                .owners
                .get(&range.id)
                .and_then(|index| self.processors.get_mut(index));
            if let Some(processor) = processor {
                processor.accumulate(
                    &object.template.curves,
                    frame as f64 - range.anchor,
                    object.velocity_scale(range.velocity),
                );
            }
        }
        Ok(())
    }

    fn commit(&mut self, frame: i64, sink: &mut dyn KeyframeSink) -> Result<()> {
        for processor in self.processors.values() {
            processor.commit(frame as f64, sink);
        }
        Ok(())
    }

    fn pool_size(&self) -> Option<usize> {
        Some(self.pool.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Axis, ChannelPath};
    use crate::scene::{AnimatedObject, InstrumentFamily};
    use crate::sink::RecordingSink;
    use crate::template::{AnimationTemplate, ChannelCurve};
    use keycurves::Keyframe;
    use midi_perform::{FeedbackCollector, Note, Track};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn arc() -> Arc<AnimationTemplate> {
        Arc::new(
            AnimationTemplate::new(
                "arc",
                vec![ChannelCurve::new(
                    ChannelPath::Location(Axis::Z),
                    vec![Keyframe::new(-2.0, 0.0), Keyframe::new(0.0, 1.0), Keyframe::new(2.0, 0.0)],
                )],
                Vec::new(),
                0.0,
            )
            .unwrap(),
        )
    }

    fn group() -> ObjectGroup {
        let mut group = ObjectGroup::new("kick", InstrumentFamily::Projectile)
            .with_object(AnimatedObject::new("drum", vec![36], arc()).with_location([0.0, 0.0, 10.0]));
        group.proxy_prefix = "ball".to_string();
        group
    }

    fn track(onsets: &[f64]) -> Track {
        let mut track = Track::new("kick");
        track.notes = onsets
            .iter()
            .map(|&t| Note {
                channel: 9,
                number: 36,
                velocity: 127,
                time_on: t,
                time_off: t + 0.1,
            })
            .collect();
        track
    }

    #[test]
    fn proxies_are_hidden_then_shown_per_note() {
        let group = group();
        let mut sink = RecordingSink::new();
        let mut instrument = ProjectileInstrument::new(&group, FrameRate::new(1, 1));
        let report = instrument
            .animate(&track(&[10.0]), &mut sink, &mut FeedbackCollector::new())
            .unwrap();

        assert_eq!(report.pool_size, Some(1));
        // range [7, 13]: hidden before it, shown on entry, hidden after the end
        assert_eq!(
            sink.visibility("ball_kick_0"),
            vec![(6.0, false), (7.0, true), (14.0, false)]
        );
        let z = sink.keyframes("ball_kick_0", &ChannelPath::Location(Axis::Z));
        assert!(z.contains(&(10.0, 11.0)));
        assert!(z.contains(&(7.0, 10.0)));
        assert!(sink.keyframes("drum", &ChannelPath::Location(Axis::Z)).is_empty());
    }

    #[test]
    fn overlapping_notes_use_separate_proxies() {
        let group = group();
        let mut sink = RecordingSink::new();
        let mut instrument = ProjectileInstrument::new(&group, FrameRate::new(1, 1));
        let report = instrument
            .animate(&track(&[0.0, 2.0, 20.0]), &mut sink, &mut FeedbackCollector::new())
            .unwrap();

        assert_eq!(report.pool_size, Some(2));
        assert_eq!(instrument.peak_in_use(), 2);
        assert_eq!(
            sink.visibility("ball_kick_0"),
            vec![(-4.0, false), (-3.0, true), (4.0, false)]
        );
        // the third note reuses the most recently returned proxy
        assert_eq!(
            sink.visibility("ball_kick_1"),
            vec![(-4.0, false), (-1.0, true), (6.0, false), (17.0, true), (24.0, false)]
        );
    }

    #[test]
    fn retiring_an_unadmitted_range_names_the_range() {
        let group = group();
        let mut sink = RecordingSink::new();
        let mut instrument = ProjectileInstrument::new(&group, FrameRate::new(1, 1));
        let range = FrameRange {
            id: RangeId(7),
            start: 0,
            end: 4,
            object: 0,
            note: 0,
            note_number: 36,
            velocity: 127,
            anchor: 2.0,
            release_anchor: 2.1,
        };
        instrument.pre_animate(std::slice::from_ref(&range), &mut sink).unwrap();

        let err = instrument.retire(5, &range, &mut sink).unwrap_err();
        assert!(matches!(err, Error::RangeNotAdmitted { range: 7, .. }), "{err}");
        assert_eq!(instrument.peak_in_use(), 0);
    }
}
