use super::Instrument;
use crate::frame_range::FrameRange;
use crate::processor::{AnimationProcessor, LocationMode};
use crate::scene::ObjectGroup;
use crate::sink::KeyframeSink;
use crate::timebase::FrameRate;
use crate::Result;
use std::collections::BTreeMap;

struct Slot {
    processor: AnimationProcessor,
    active: usize,
}

/// Animates the group's own objects by sampling their template every frame.
///
/// An object is processed only while at least one of its ranges is active,
/// so nothing is written for it outside its notes.
pub struct EvaluateInstrument<'g> {
    group: &'g ObjectGroup,
    rate: FrameRate,
    slots: BTreeMap<usize, Slot>,
}

impl<'g> EvaluateInstrument<'g> {
    pub fn new(group: &'g ObjectGroup, rate: FrameRate) -> Self {
        Self {
            group,
            rate,
            slots: BTreeMap::new(),
        }
    }
}

impl Instrument for EvaluateInstrument<'_> {
    fn group(&self) -> &ObjectGroup {
        self.group
    }

    fn rate(&self) -> FrameRate {
        self.rate
    }

    fn pre_animate(&mut self, _ranges: &[FrameRange], _sink: &mut dyn KeyframeSink) -> Result<()> {
        self.slots.clear();
        Ok(())
    }

    fn admit(&mut self, _frame: i64, range: &FrameRange, _sink: &mut dyn KeyframeSink) -> Result<()> {
        let object = &self.group.objects[range.object];
        self.slots
            .entry(range.object)
            .or_insert_with(|| Slot {
                processor: AnimationProcessor::new(
                    object.name.clone(),
                    LocationMode::Absolute,
                    object.location,
                    object.rotation,
                ),
                active: 0,
            })
            .active += 1;
        Ok(())
    }

    fn retire(&mut self, _frame: i64, range: &FrameRange, _sink: &mut dyn KeyframeSink) -> Result<()> {
        if let Some(slot) = self.slots.get_mut(&range.object) {
            slot.active = slot.active.saturating_sub(1);
            if slot.active == 0 {
                self.slots.remove(&range.object);
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, frame: i64, active: &[FrameRange]) -> Result<()> {
        for slot in self.slots.values_mut() {
            slot.processor.begin_frame();
        }
        for range in active {
            let object = &self.group.objects[range.object];
            if let Some(slot) = self.slots.get_mut(&range.object) {
                slot.processor.accumulate(
                    &object.template.curves,
                    frame as f64 - range.anchor,
                    object.velocity_scale(range.velocity),
                );
            }
        }
        Ok(())
    }

    fn commit(&mut self, frame: i64, sink: &mut dyn KeyframeSink) -> Result<()> {
        for slot in self.slots.values() {
            slot.processor.commit(frame as f64, sink);
        }
        Ok(())
    }
}
