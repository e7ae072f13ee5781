use crate::note::{ControllerEvent, ControllerKind, Note};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named grouping of notes and controller events sharing one timeline.
///
/// Tracks are produced by ingestion and are read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Sorted by `time_on`.
    pub notes: Vec<Note>,
    pub control_change: BTreeMap<u8, Vec<ControllerEvent>>,
    pub pitch_bend: Vec<ControllerEvent>,
    pub aftertouch: Vec<ControllerEvent>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// No notes and no controller data of any kind.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
            && self.control_change.is_empty()
            && self.pitch_bend.is_empty()
            && self.aftertouch.is_empty()
    }

    /// Distinct note numbers played on this track, ascending.
    pub fn all_used_notes(&self) -> Vec<u8> {
        let mut used: Vec<u8> = self.notes.iter().map(|n| n.number).collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    pub fn controller(&self, kind: ControllerKind) -> &[ControllerEvent] {
        match kind {
            ControllerKind::ControlChange(number) => self
                .control_change
                .get(&number)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            ControllerKind::PitchBend => &self.pitch_bend,
            ControllerKind::Aftertouch => &self.aftertouch,
        }
    }

    pub fn first_note_time(&self) -> Option<f64> {
        self.notes.first().map(|n| n.time_on)
    }

    pub fn last_note_off(&self) -> Option<f64> {
        self.notes.iter().map(|n| n.time_off).reduce(f64::max)
    }

    /// Combine two tracks into a new one. Neither input is modified.
    ///
    /// Notes are concatenated and re-sorted by onset. Controller maps are
    /// unioned; when both tracks carry the same controller number the event
    /// lists are concatenated and re-sorted by time.
    pub fn merge(&self, other: &Track, name: Option<&str>) -> Track {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} & {}", self.name, other.name));

        let mut notes: Vec<Note> = self.notes.iter().chain(&other.notes).cloned().collect();
        sort_notes(&mut notes);

        let mut control_change = self.control_change.clone();
        for (number, events) in &other.control_change {
            let merged = control_change.entry(*number).or_default();
            merged.extend(events.iter().cloned());
            sort_events(merged);
        }

        let mut pitch_bend: Vec<ControllerEvent> =
            self.pitch_bend.iter().chain(&other.pitch_bend).cloned().collect();
        sort_events(&mut pitch_bend);

        let mut aftertouch: Vec<ControllerEvent> =
            self.aftertouch.iter().chain(&other.aftertouch).cloned().collect();
        sort_events(&mut aftertouch);

        Track {
            name,
            notes,
            control_change,
            pitch_bend,
            aftertouch,
        }
    }
}

/// Stable sort by onset so simultaneous notes keep their arrival order.
pub(crate) fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| a.time_on.total_cmp(&b.time_on));
}

pub(crate) fn sort_events(events: &mut [ControllerEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// The ingested performance: every non-empty track, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub tracks: Vec<Track>,
}

impl Performance {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn find_track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    pub fn track_names(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn merge_tracks(&self, first: &str, second: &str, name: Option<&str>) -> Option<Track> {
        let a = self.find_track(first)?;
        let b = self.find_track(second)?;
        Some(a.merge(b, name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }
}

impl IntoIterator for Performance {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

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
    fn empty_track_classification() {
        let mut track = Track::new("empty");
        assert!(track.is_empty());
        track.aftertouch.push(ControllerEvent::new(0, 12.0, 0.5));
        assert!(!track.is_empty());
    }

    #[test]
    fn merge_resorts_and_leaves_inputs_alone() {
        let mut a = Track::new("a");
        a.notes = vec![note(60, 0.0, 1.0), note(62, 2.0, 3.0)];
        a.control_change
            .insert(7, vec![ControllerEvent::new(0, 100.0, 1.5)]);

        let mut b = Track::new("b");
        b.notes = vec![note(64, 1.0, 1.5)];
        b.control_change
            .insert(7, vec![ControllerEvent::new(0, 90.0, 0.5)]);
        b.control_change
            .insert(1, vec![ControllerEvent::new(0, 20.0, 0.0)]);

        let merged = a.merge(&b, None);

        assert_eq!(merged.name, "a & b");
        let onsets: Vec<f64> = merged.notes.iter().map(|n| n.time_on).collect();
        assert_eq!(onsets, vec![0.0, 1.0, 2.0]);
        let cc7: Vec<f64> = merged.control_change[&7].iter().map(|e| e.time).collect();
        assert_eq!(cc7, vec![0.5, 1.5]);
        assert!(merged.control_change.contains_key(&1));

        assert_eq!(a.notes.len(), 2);
        assert_eq!(b.notes.len(), 1);
    }

    #[test]
    fn used_notes_are_distinct_and_sorted() {
        let mut track = Track::new("t");
        track.notes = vec![note(64, 0.0, 1.0), note(60, 1.0, 2.0), note(64, 2.0, 3.0)];
        assert_eq!(track.all_used_notes(), vec![60, 64]);
    }

    #[test]
    fn performance_lookup() {
        let perf = Performance::new(vec![Track::new("Piano"), Track::new("Drumset")]);
        assert!(perf.find_track("Drumset").is_some());
        assert!(perf.find_track("Bass").is_none());
        assert_eq!(perf.track_names(), vec!["Piano", "Drumset"]);
        let merged = perf.merge_tracks("Piano", "Drumset", Some("All")).unwrap();
        assert_eq!(merged.name, "All");
    }
}
