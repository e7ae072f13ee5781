//! Typed, tick-based input events.
//!
//! The ingestor never looks at bytes. [`RawSource::from_smf`] decodes a
//! Standard MIDI File with midly; tests and other front ends can build a
//! [`RawSource`] directly.

use crate::{Error, Result};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use serde::{Deserialize, Serialize};

/// SMF format class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatClass {
    /// Format 0: one track, events addressed by channel
    SingleTrack,
    /// Format 1: simultaneous tracks sharing one timeline
    MultiTrack,
    /// Format 2: independent sequences with no shared timeline
    Sequential,
}

impl FormatClass {
    pub fn as_number(self) -> u8 {
        match self {
            FormatClass::SingleTrack => 0,
            FormatClass::MultiTrack => 1,
            FormatClass::Sequential => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawEventKind {
    NoteOn { channel: u8, number: u8, velocity: u8 },
    NoteOff { channel: u8, number: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// 14-bit value, centre 8192
    PitchBend { channel: u8, value: u16 },
    /// Channel pressure
    Aftertouch { channel: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// Microseconds per quarter note
    Tempo(u32),
    TrackName(String),
    EndOfTrack,
    /// Anything the event model does not keep (sysex, poly pressure, other meta).
    Other,
}

impl RawEventKind {
    pub fn channel(&self) -> Option<u8> {
        match *self {
            RawEventKind::NoteOn { channel, .. }
            | RawEventKind::NoteOff { channel, .. }
            | RawEventKind::ControlChange { channel, .. }
            | RawEventKind::PitchBend { channel, .. }
            | RawEventKind::Aftertouch { channel, .. }
            | RawEventKind::ProgramChange { channel, .. } => Some(channel),
            _ => None,
        }
    }
}

/// One event, positioned by the tick delta from the previous event in its track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub delta: u32,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn new(delta: u32, kind: RawEventKind) -> Self {
        Self { delta, kind }
    }
}

/// Everything the ingestor needs from a decoded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSource {
    pub format: FormatClass,
    /// Pulses per quarter note
    pub ppq: u16,
    pub tracks: Vec<Vec<RawEvent>>,
}

impl RawSource {
    /// Decode a Standard MIDI File.
    ///
    /// SMPTE timecode files fall back to 480 PPQ.
    pub fn from_smf(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes).map_err(|e| Error::MidiParse(e.to_string()))?;

        let ppq = match smf.header.timing {
            midly::Timing::Metrical(ticks) => ticks.as_int(),
            midly::Timing::Timecode(_, _) => 480,
        };

        let format = match smf.header.format {
            midly::Format::SingleTrack => FormatClass::SingleTrack,
            midly::Format::Parallel => FormatClass::MultiTrack,
            midly::Format::Sequential => FormatClass::Sequential,
        };

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| RawEvent::new(event.delta.as_int(), convert_kind(event.kind)))
                    .collect()
            })
            .collect();

        Ok(RawSource {
            format,
            ppq,
            tracks,
        })
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }
}

fn convert_kind(kind: TrackEventKind<'_>) -> RawEventKind {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => RawEventKind::NoteOn {
                    channel,
                    number: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, .. } => RawEventKind::NoteOff {
                    channel,
                    number: key.as_int(),
                },
                MidiMessage::Controller { controller, value } => RawEventKind::ControlChange {
                    channel,
                    controller: controller.as_int(),
                    value: value.as_int(),
                },
                MidiMessage::PitchBend { bend } => RawEventKind::PitchBend {
                    channel,
                    value: bend.0.as_int(),
                },
                MidiMessage::ChannelAftertouch { vel } => RawEventKind::Aftertouch {
                    channel,
                    value: vel.as_int(),
                },
                MidiMessage::ProgramChange { program } => RawEventKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                },
                MidiMessage::Aftertouch { .. } => RawEventKind::Other,
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => RawEventKind::Tempo(tempo.as_int()),
        TrackEventKind::Meta(MetaMessage::TrackName(bytes)) => {
            RawEventKind::TrackName(String::from_utf8_lossy(bytes).trim().to_string())
        }
        TrackEventKind::Meta(MetaMessage::EndOfTrack) => RawEventKind::EndOfTrack,
        _ => RawEventKind::Other,
    }
}
