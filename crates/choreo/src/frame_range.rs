use crate::scene::ObjectGroup;
use crate::timebase::FrameRate;
use midi_perform::{note_name, DiagnosticSink, Feedback, Track};
use serde::Serialize;

/// Frames of padding added on each side of a note's template window.
pub const SLACK: i64 = 1;

/// Identity of one note-to-object realization within a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RangeId(pub usize);

/// The absolute frames during which one note animates one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRange {
    pub id: RangeId,
    pub start: i64,
    pub end: i64,
    /// Index into the group's objects
    pub object: usize,
    /// Index into the track's notes
    pub note: usize,
    pub note_number: u8,
    pub velocity: u8,
    /// Frame the template origin lands on: note onset minus hit offset
    pub anchor: f64,
    /// Frame the release curves start from
    pub release_anchor: f64,
}

impl FrameRange {
    pub fn contains(&self, frame: i64) -> bool {
        self.start <= frame && frame <= self.end
    }

    /// The template window without slack.
    pub fn core(&self) -> (i64, i64) {
        (self.start + SLACK, self.end - SLACK)
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.start, self.end)
    }
}

/// Ranges for one track and group, plus how many note instances had no object.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// Sorted by start frame
    pub ranges: Vec<FrameRange>,
    pub skipped_notes: usize,
}

impl Schedule {
    pub fn first_frame(&self) -> Option<i64> {
        self.ranges.iter().map(|r| r.start).min()
    }

    pub fn last_frame(&self) -> Option<i64> {
        self.ranges.iter().map(|r| r.end).max()
    }
}

/// Frame windows for every note the group maps, sorted by start.
///
/// Notes with no mapped object are reported and skipped.
pub fn schedule(
    track: &Track,
    group: &ObjectGroup,
    rate: FrameRate,
    diagnostics: &mut dyn DiagnosticSink,
) -> Schedule {
    let note_map = group.note_map();
    let mut ranges = Vec::new();
    let mut skipped_notes = 0;

    for (note_index, note) in track.notes.iter().enumerate() {
        let Some(objects) = note_map.get(&note.number) else {
            skipped_notes += 1;
            diagnostics.report(
                Feedback::warning(format!(
                    "note {}/{} has no object in group '{}'",
                    note.number,
                    note_name(note.number),
                    group.name
                ))
                .at_time(note.time_on),
            );
            continue;
        };

        let onset = rate.to_frames(note.time_on);
        let release = rate.to_frames(note.time_off);
        for &object_index in objects {
            let object = &group.objects[object_index];
            let template = &object.template;
            let anchor = onset - object.hit_offset;
            ranges.push(FrameRange {
                id: RangeId(0),
                start: (anchor + template.min_offset()).floor() as i64 - SLACK,
                end: (anchor + template.max_offset()).ceil() as i64 + SLACK,
                object: object_index,
                note: note_index,
                note_number: note.number,
                velocity: note.velocity,
                anchor,
                release_anchor: release + template.release_offset,
            });
        }
    }

    ranges.sort_by_key(|r| r.start);
    for (i, range) in ranges.iter_mut().enumerate() {
        range.id = RangeId(i);
    }

    tracing::debug!(
        group = %group.name,
        track = %track.name,
        ranges = ranges.len(),
        skipped_notes,
        "computed frame ranges"
    );
    Schedule {
        ranges,
        skipped_notes,
    }
}

/// [`schedule`] without the skip count.
pub fn compute_frame_ranges(
    track: &Track,
    group: &ObjectGroup,
    rate: FrameRate,
    diagnostics: &mut dyn DiagnosticSink,
) -> Vec<FrameRange> {
    schedule(track, group, rate, diagnostics).ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Axis, ChannelPath};
    use crate::scene::{AnimatedObject, InstrumentFamily};
    use crate::template::{AnimationTemplate, ChannelCurve};
    use keycurves::Keyframe;
    use midi_perform::{FeedbackCollector, Note};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn template(lo: f64, hi: f64) -> Arc<AnimationTemplate> {
        Arc::new(
            AnimationTemplate::new(
                "t",
                vec![ChannelCurve::new(
                    ChannelPath::Location(Axis::Z),
                    vec![Keyframe::new(lo, 0.0), Keyframe::new(hi, 0.0)],
                )],
                Vec::new(),
                0.0,
            )
            .unwrap(),
        )
    }

    fn note(number: u8, on: f64, off: f64) -> Note {
        Note {
            channel: 0,
            number,
            velocity: 100,
            time_on: on,
            time_off: off,
        }
    }

    #[test]
    fn windows_follow_onset_hit_and_extent() {
        let group = ObjectGroup::new("g", InstrumentFamily::Evaluate)
            .with_object(AnimatedObject::new("a", vec![60], template(0.0, 10.0)).with_hit_offset(4.0));
        let mut track = Track::new("t");
        track.notes = vec![note(60, 1.0, 1.5)];

        let ranges = compute_frame_ranges(&track, &group, FrameRate::new(24, 1), &mut FeedbackCollector::new());
        // onset frame 24, anchor 20, window [20, 30] padded by one frame
        assert_eq!(ranges[0].bounds(), (19, 31));
        assert_eq!(ranges[0].core(), (20, 30));
        assert_eq!(ranges[0].anchor, 20.0);
        assert_eq!(ranges[0].release_anchor, 36.0);
    }

    #[test]
    fn unmapped_notes_are_skipped_with_warning() {
        let group = ObjectGroup::new("g", InstrumentFamily::Evaluate)
            .with_object(AnimatedObject::new("a", vec![60], template(0.0, 2.0)));
        let mut track = Track::new("t");
        track.notes = vec![note(60, 0.0, 0.1), note(61, 0.5, 0.6), note(60, 1.0, 1.1)];

        let mut diagnostics = FeedbackCollector::new();
        let sched = schedule(&track, &group, FrameRate::default(), &mut diagnostics);
        assert_eq!(sched.ranges.len(), 2);
        assert_eq!(sched.skipped_notes, 1);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.feedback()[0].time, Some(0.5));
    }

    #[test]
    fn one_note_many_objects_sorted_by_start() {
        let group = ObjectGroup::new("g", InstrumentFamily::Evaluate)
            .with_object(AnimatedObject::new("late", vec![60], template(5.0, 8.0)))
            .with_object(AnimatedObject::new("early", vec![60], template(-5.0, 1.0)));
        let mut track = Track::new("t");
        track.notes = vec![note(60, 0.0, 0.1)];

        let ranges = compute_frame_ranges(&track, &group, FrameRate::default(), &mut FeedbackCollector::new());
        let objects: Vec<usize> = ranges.iter().map(|r| r.object).collect();
        assert_eq!(objects, vec![1, 0]);
        let ids: Vec<RangeId> = ranges.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RangeId(0), RangeId(1)]);
    }
}
