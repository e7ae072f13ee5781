pub mod feedback;
pub mod gm;
pub mod ingest;
pub mod note;
pub mod pitch;
pub mod raw;
pub mod tempo;
pub mod track;

pub use feedback::{DiagnosticSink, Feedback, FeedbackCollector, FeedbackLevel, NullSink};
pub use ingest::{build_tempo_map, ingest, ingest_smf, AddressingMode};
pub use note::{normalize_pitch_bend, ControllerEvent, ControllerKind, Note};
pub use pitch::{note_name, parse_note_name, parse_note_numbers};
pub use raw::{FormatClass, RawEvent, RawEventKind, RawSource};
pub use tempo::{seconds_to_ticks, ticks_to_seconds, TempoEntry, TempoMap, DEFAULT_TEMPO};
pub use track::{Performance, Track};

/// Errors from MIDI ingestion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("format 2 (sequential) MIDI files have no shared timeline and are not supported")]
    UnsupportedFormat,

    #[error("note-off for note {number} on channel {channel} at {time:.3}s has no open note-on")]
    UnmatchedNoteOff { channel: u8, number: u8, time: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
