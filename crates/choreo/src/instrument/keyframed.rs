use super::Instrument;
use crate::channel::ChannelPath;
use crate::frame_range::FrameRange;
use crate::scene::ObjectGroup;
use crate::sink::KeyframeSink;
use crate::timebase::FrameRate;
use crate::Result;
use keycurves::{shifted, Combiner, Keyframe};
use std::collections::BTreeMap;

/// Places each note's template keys on the timeline and merges them.
///
/// Nothing is sampled per frame. Note-on curves are moved to the note's
/// anchor, release curves to its release anchor, and every object channel
/// folds its sequences together with the combiner once the sweep is done.
pub struct KeyframedInstrument<'g> {
    group: &'g ObjectGroup,
    rate: FrameRate,
    combiner: Combiner,
    sequences: BTreeMap<(usize, ChannelPath), Vec<Vec<Keyframe>>>,
}

impl<'g> KeyframedInstrument<'g> {
    pub fn new(group: &'g ObjectGroup, rate: FrameRate, combiner: Combiner) -> Self {
        Self {
            group,
            rate,
            combiner,
            sequences: BTreeMap::new(),
        }
    }

    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }
}

impl Instrument for KeyframedInstrument<'_> {
    fn group(&self) -> &ObjectGroup {
        self.group
    }

    fn rate(&self) -> FrameRate {
        self.rate
    }

    fn pre_animate(&mut self, _ranges: &[FrameRange], _sink: &mut dyn KeyframeSink) -> Result<()> {
        self.sequences.clear();
        Ok(())
    }

    fn admit(&mut self, _frame: i64, range: &FrameRange, _sink: &mut dyn KeyframeSink) -> Result<()> {
        let object = &self.group.objects[range.object];
        let scale = object.velocity_scale(range.velocity);

        let onset = object.template.curves.iter().map(|c| (c, range.anchor));
        let release = object
            .template
            .release_curves
            .iter()
            .map(|c| (c, range.release_anchor));
        for (curve, anchor) in onset.chain(release) {
            self.sequences
                .entry((range.object, curve.channel.clone()))
                .or_default()
                .push(shifted(&curve.keys, anchor, scale));
        }
        Ok(())
    }

    fn accumulate(&mut self, _frame: i64, _active: &[FrameRange]) -> Result<()> {
        Ok(())
    }

    fn commit(&mut self, _frame: i64, _sink: &mut dyn KeyframeSink) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, sink: &mut dyn KeyframeSink) -> Result<()> {
        for ((object_index, channel), sequences) in std::mem::take(&mut self.sequences) {
            let object = &self.group.objects[object_index];
            let rest = match &channel {
                ChannelPath::Location(axis) => object.location[axis.index()],
                ChannelPath::Rotation(axis) => object.rotation[axis.index()],
                ChannelPath::Property(_) | ChannelPath::ShapeKey(_) => 0.0,
            };

            let merged = self.combiner.combine_all(sequences)?;
            for key in &merged {
                sink.set_keyframe(&object.name, &channel, key.frame, rest + key.value);
            }
            tracing::trace!(
                object = %object.name,
                channel = %channel,
                keys = merged.len(),
                "keyframed channel written"
            );
        }
        Ok(())
    }
}
