use serde::{Deserialize, Serialize};

/// 120 BPM, the SMF default when a file carries no tempo event.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// A tempo change at an absolute time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEntry {
    pub time: f64,
    /// Microseconds per quarter note
    pub tempo: u32,
}

impl TempoEntry {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.tempo as f64
    }
}

/// Time-ordered tempo changes for converting tick deltas to seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoMap {
    entries: Vec<TempoEntry>,
}

impl TempoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change. Times must not decrease; an out-of-order entry is
    /// inserted at its sorted position after any entries with the same time.
    pub fn push(&mut self, time: f64, tempo: u32) {
        let at = self.entries.partition_point(|e| e.time <= time);
        self.entries.insert(at, TempoEntry { time, tempo });
    }

    pub fn entries(&self) -> &[TempoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tempo in force at `time`: the latest entry at or before it.
    ///
    /// Several entries sharing that time resolve to the earliest of them.
    /// Times before the first entry take the first entry's tempo, and an
    /// empty map yields [`DEFAULT_TEMPO`].
    pub fn tempo_at(&self, time: f64) -> u32 {
        let Some(first) = self.entries.first() else {
            return DEFAULT_TEMPO;
        };
        let at_or_before = self.entries.partition_point(|e| e.time <= time);
        if at_or_before == 0 {
            return first.tempo;
        }
        let boundary = self.entries[at_or_before - 1].time;
        let earliest_tie = self.entries.partition_point(|e| e.time < boundary);
        self.entries[earliest_tie].tempo
    }
}

/// Seconds spanned by `ticks` at a constant tempo.
pub fn ticks_to_seconds(ticks: u64, tempo: u32, ppq: u16) -> f64 {
    ticks as f64 * tempo as f64 / (ppq.max(1) as f64 * 1_000_000.0)
}

/// Inverse of [`ticks_to_seconds`], as a real number of ticks.
pub fn seconds_to_ticks(seconds: f64, tempo: u32, ppq: u16) -> f64 {
    seconds * ppq.max(1) as f64 * 1_000_000.0 / tempo as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_uses_default() {
        assert_eq!(TempoMap::new().tempo_at(3.0), DEFAULT_TEMPO);
    }

    #[test]
    fn lookup_is_at_or_before() {
        let mut map = TempoMap::new();
        map.push(0.0, 500_000);
        map.push(2.0, 250_000);

        assert_eq!(map.tempo_at(1.999), 500_000);
        assert_eq!(map.tempo_at(2.0), 250_000);
        assert_eq!(map.tempo_at(9.0), 250_000);
    }

    #[test]
    fn before_first_entry_uses_first() {
        let mut map = TempoMap::new();
        map.push(1.0, 400_000);
        assert_eq!(map.tempo_at(0.5), 400_000);
    }

    #[test]
    fn tie_resolves_to_earliest_entry() {
        let mut map = TempoMap::new();
        map.push(0.0, 500_000);
        map.push(1.0, 600_000);
        map.push(1.0, 700_000);

        assert_eq!(map.tempo_at(1.0), 600_000);
        assert_eq!(map.tempo_at(1.5), 600_000);
    }

    #[test]
    fn tick_conversion() {
        // one quarter note at 120 BPM
        assert_eq!(ticks_to_seconds(480, 500_000, 480), 0.5);
        assert_eq!(seconds_to_ticks(0.5, 500_000, 480), 480.0);
    }
}
