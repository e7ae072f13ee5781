//! Raw tick-based events -> tracks of timed notes and controllers.

use crate::feedback::{DiagnosticSink, Feedback};
use crate::gm;
use crate::note::{normalize_pitch_bend, ControllerEvent, Note};
use crate::raw::{FormatClass, RawEvent, RawEventKind, RawSource};
use crate::tempo::{ticks_to_seconds, TempoMap, DEFAULT_TEMPO};
use crate::track::{sort_events, sort_notes, Performance, Track};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

const CHANNELS: usize = 16;

/// How source events are grouped into output tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// One output track per MIDI channel, routed by each message's channel.
    ChannelAddressed,
    /// One output track per source track.
    TrackAddressed,
}

impl AddressingMode {
    pub fn for_format(format: FormatClass) -> Result<Self> {
        match format {
            FormatClass::SingleTrack => Ok(AddressingMode::ChannelAddressed),
            FormatClass::MultiTrack => Ok(AddressingMode::TrackAddressed),
            FormatClass::Sequential => Err(Error::UnsupportedFormat),
        }
    }
}

/// Decode an SMF and ingest it with the addressing mode its format implies.
pub fn ingest_smf(bytes: &[u8], diagnostics: &mut dyn DiagnosticSink) -> Result<Performance> {
    let source = RawSource::from_smf(bytes)?;
    let mode = AddressingMode::for_format(source.format)?;
    ingest(&source, mode, diagnostics)
}

/// Build the performance from raw events.
///
/// Fails on format class 2 and on a note-off with no open note-on.
/// Empty tracks are dropped from the result.
pub fn ingest(
    source: &RawSource,
    mode: AddressingMode,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<Performance> {
    if source.format == FormatClass::Sequential {
        return Err(Error::UnsupportedFormat);
    }

    let tracks = match mode {
        AddressingMode::ChannelAddressed => ingest_by_channel(source, diagnostics)?,
        AddressingMode::TrackAddressed => ingest_by_track(source, diagnostics)?,
    };

    let total = tracks.len();
    let tracks: Vec<Track> = tracks.into_iter().filter(|t| !t.is_empty()).collect();
    tracing::debug!(
        ?mode,
        kept = tracks.len(),
        discarded = total - tracks.len(),
        "ingested performance"
    );
    Ok(Performance::new(tracks))
}

/// Every event of every source track in absolute tick order.
/// Events on the same tick keep source-track order.
fn merge_by_tick(source: &RawSource) -> Vec<(u64, &RawEvent)> {
    let mut merged = Vec::with_capacity(source.event_count());
    for track in &source.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta as u64;
            merged.push((tick, event));
        }
    }
    merged.sort_by_key(|(tick, _)| *tick);
    merged
}

/// Tempo map built from a merged pass over all tracks, in seconds.
pub fn build_tempo_map(source: &RawSource) -> TempoMap {
    let mut map = TempoMap::new();
    let mut tempo = DEFAULT_TEMPO;
    let mut last_tick = 0u64;
    let mut seconds = 0.0;
    for (tick, event) in merge_by_tick(source) {
        seconds += ticks_to_seconds(tick - last_tick, tempo, source.ppq);
        last_tick = tick;
        if let RawEventKind::Tempo(t) = event.kind {
            tempo = t;
            map.push(seconds, t);
        }
    }
    map
}

fn ingest_by_channel(
    source: &RawSource,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<Vec<Track>> {
    let mut builders: Vec<TrackBuilder> = (0..CHANNELS).map(|_| TrackBuilder::default()).collect();
    let mut tempo = DEFAULT_TEMPO;
    let mut last_tick = 0u64;
    let mut seconds = 0.0;

    for (tick, event) in merge_by_tick(source) {
        seconds += ticks_to_seconds(tick - last_tick, tempo, source.ppq);
        last_tick = tick;

        match &event.kind {
            RawEventKind::Tempo(t) => tempo = *t,
            // the name carries no channel; it belongs to the first one
            kind @ RawEventKind::TrackName(_) => builders[0].apply(kind, seconds)?,
            kind => {
                if let Some(channel) = kind.channel() {
                    builders[(channel & 0x0f) as usize].apply(kind, seconds)?;
                }
            }
        }
    }

    Ok(builders
        .into_iter()
        .enumerate()
        .map(|(channel, builder)| {
            builder.finish(format!("Track {}", channel + 1), seconds, diagnostics)
        })
        .collect())
}

fn ingest_by_track(
    source: &RawSource,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<Vec<Track>> {
    let tempo_map = build_tempo_map(source);
    let mut tracks = Vec::with_capacity(source.tracks.len());

    for (index, events) in source.tracks.iter().enumerate() {
        let mut builder = TrackBuilder::default();
        let mut seconds = 0.0;
        for event in events {
            seconds += ticks_to_seconds(event.delta as u64, tempo_map.tempo_at(seconds), source.ppq);
            builder.apply(&event.kind, seconds)?;
        }
        tracks.push(builder.finish(format!("Track {}", index + 1), seconds, diagnostics));
    }

    Ok(tracks)
}

/// Accumulates one output track while pairing note-ons with note-offs.
#[derive(Default)]
struct TrackBuilder {
    name: Option<String>,
    program_name: Option<&'static str>,
    notes: Vec<Note>,
    /// Indices into `notes` still waiting for a note-off, oldest first.
    open: HashMap<(u8, u8), VecDeque<usize>>,
    track: Track,
}

impl TrackBuilder {
    fn apply(&mut self, kind: &RawEventKind, time: f64) -> Result<()> {
        match *kind {
            RawEventKind::NoteOn {
                channel,
                number,
                velocity: 0,
            }
            | RawEventKind::NoteOff { channel, number } => self.note_off(channel, number, time)?,
            RawEventKind::NoteOn {
                channel,
                number,
                velocity,
            } => {
                self.open
                    .entry((channel, number))
                    .or_default()
                    .push_back(self.notes.len());
                self.notes.push(Note {
                    channel,
                    number,
                    velocity,
                    time_on: time,
                    time_off: time,
                });
            }
            RawEventKind::ControlChange {
                channel,
                controller,
                value,
            } => self
                .track
                .control_change
                .entry(controller)
                .or_default()
                .push(ControllerEvent::new(channel, value as f64, time)),
            RawEventKind::PitchBend { channel, value } => self
                .track
                .pitch_bend
                .push(ControllerEvent::new(channel, normalize_pitch_bend(value), time)),
            RawEventKind::Aftertouch { channel, value } => self
                .track
                .aftertouch
                .push(ControllerEvent::new(channel, value as f64, time)),
            RawEventKind::ProgramChange { channel, program } => {
                if self.program_name.is_none() {
                    self.program_name = gm::channel_program_name(channel, program);
                }
            }
            RawEventKind::TrackName(ref name) => {
                if self.name.is_none() && !name.is_empty() {
                    self.name = Some(name.clone());
                }
            }
            RawEventKind::Tempo(_) | RawEventKind::EndOfTrack | RawEventKind::Other => {}
        }
        Ok(())
    }

    fn note_off(&mut self, channel: u8, number: u8, time: f64) -> Result<()> {
        let index = self
            .open
            .get_mut(&(channel, number))
            .and_then(VecDeque::pop_front)
            .ok_or(Error::UnmatchedNoteOff {
                channel,
                number,
                time,
            })?;
        self.notes[index].time_off = time;
        Ok(())
    }

    fn finish(
        mut self,
        fallback_name: String,
        end_time: f64,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Track {
        let name = self
            .name
            .take()
            .or_else(|| self.program_name.map(str::to_string))
            .unwrap_or(fallback_name);

        let mut unclosed: Vec<usize> = self.open.values().flatten().copied().collect();
        unclosed.sort_unstable();
        for index in unclosed {
            let note = &mut self.notes[index];
            note.time_off = end_time;
            diagnostics.report(
                Feedback::warning(format!(
                    "note {} on channel {} in '{}' never released; closed at end of track",
                    note.number, note.channel, name
                ))
                .at_time(note.time_on),
            );
        }

        let mut track = self.track;
        track.name = name;
        track.notes = self.notes;
        sort_notes(&mut track.notes);
        for events in track.control_change.values_mut() {
            sort_events(events);
        }
        sort_events(&mut track.pitch_bend);
        sort_events(&mut track.aftertouch);
        track
    }
}
