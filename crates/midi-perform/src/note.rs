use serde::{Deserialize, Serialize};

/// A single played note with absolute times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub channel: u8,
    pub number: u8,
    pub velocity: u8,
    pub time_on: f64,
    pub time_off: f64,
}

impl Note {
    pub fn duration(&self) -> f64 {
        (self.time_off - self.time_on).max(0.0)
    }
}

/// Which continuous controller an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    ControlChange(u8),
    PitchBend,
    Aftertouch,
}

/// A continuous controller sample.
///
/// Control change and aftertouch values are the raw 0-127 data byte.
/// Pitch bend is normalised to [-1.0, 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerEvent {
    pub channel: u8,
    pub value: f64,
    pub time: f64,
}

impl ControllerEvent {
    pub fn new(channel: u8, value: f64, time: f64) -> Self {
        Self {
            channel,
            value,
            time,
        }
    }
}

/// Normalise a 14-bit pitch bend (centre 8192) to [-1.0, 1.0).
pub fn normalize_pitch_bend(raw: u16) -> f64 {
    (raw as f64 - 8192.0) / 8192.0
}
