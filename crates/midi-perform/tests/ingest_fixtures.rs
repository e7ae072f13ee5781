//! Ingestion over real SMF byte streams.

use midi_perform::{
    ingest_smf, ticks_to_seconds, Error, FeedbackCollector, FormatClass, NullSink, RawSource,
};
use pretty_assertions::assert_eq;

const PPQ: u16 = 480;

fn vlq(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    bytes
}

/// Build an SMF from track bodies (each without its end-of-track event).
fn smf(format: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&format.to_be_bytes());
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&PPQ.to_be_bytes());

    for body in tracks {
        let mut track = body.clone();
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
        buf.extend_from_slice(&track);
    }
    buf
}

fn event(delta: u32, bytes: &[u8]) -> Vec<u8> {
    let mut out = vlq(delta);
    out.extend_from_slice(bytes);
    out
}

fn note_on(delta: u32, channel: u8, key: u8) -> Vec<u8> {
    event(delta, &[0x90 | channel, key, 100])
}

fn note_off(delta: u32, channel: u8, key: u8) -> Vec<u8> {
    event(delta, &[0x80 | channel, key, 0])
}

fn tempo(delta: u32, micros: u32) -> Vec<u8> {
    let b = micros.to_be_bytes();
    event(delta, &[0xFF, 0x51, 0x03, b[1], b[2], b[3]])
}

fn track_name(delta: u32, name: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0x03, name.len() as u8];
    bytes.extend_from_slice(name.as_bytes());
    event(delta, &bytes)
}

fn program(delta: u32, channel: u8, program: u8) -> Vec<u8> {
    event(delta, &[0xC0 | channel, program])
}

fn body(events: &[Vec<u8>]) -> Vec<u8> {
    events.concat()
}

#[test]
fn rejects_sequential_format() {
    let bytes = smf(2, &[body(&[note_on(0, 0, 60), note_off(480, 0, 60)])]);
    assert_eq!(
        RawSource::from_smf(&bytes).unwrap().format,
        FormatClass::Sequential
    );
    assert!(matches!(
        ingest_smf(&bytes, &mut NullSink),
        Err(Error::UnsupportedFormat)
    ));
}

#[test]
fn rejects_unmatched_note_off() {
    let bytes = smf(
        1,
        &[body(&[note_on(0, 0, 60), note_off(480, 0, 60), note_off(480, 0, 60)])],
    );
    match ingest_smf(&bytes, &mut NullSink) {
        Err(Error::UnmatchedNoteOff {
            channel,
            number,
            time,
        }) => {
            assert_eq!((channel, number), (0, 60));
            assert!((time - 1.0).abs() < 1e-9);
        }
        other => panic!("expected unmatched note-off, got {other:?}"),
    }
}

#[test]
fn note_pairing_is_first_in_first_out() {
    // 480 ticks = 0.5 s at the default 120 BPM
    let bytes = smf(
        0,
        &[body(&[
            note_on(0, 0, 60),
            note_on(480, 0, 60),
            note_off(480, 0, 60),
            note_off(480, 0, 60),
        ])],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    let spans: Vec<(f64, f64)> = perf.tracks[0]
        .notes
        .iter()
        .map(|n| (n.time_on, n.time_off))
        .collect();
    assert_eq!(spans, vec![(0.0, 1.0), (0.5, 1.5)]);
}

#[test]
fn tempo_conversion_round_trip() {
    let fps = 24.0;
    let micros = 600_000;
    let ticks = 960u32;
    let bytes = smf(
        1,
        &[
            body(&[tempo(0, micros)]),
            body(&[note_on(ticks, 0, 60), note_off(480, 0, 60)]),
        ],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    let seconds = perf.tracks[0].notes[0].time_on;
    assert!((seconds - ticks_to_seconds(ticks as u64, micros, PPQ)).abs() < 1e-9);

    let ticks_per_second = PPQ as f64 * 1_000_000.0 / micros as f64;
    let expected_frames = ticks as f64 * fps / ticks_per_second;
    assert!((seconds * fps - expected_frames).abs() < 1e-9);
}

#[test]
fn channel_addressed_routes_by_channel() {
    let bytes = smf(
        0,
        &[body(&[
            note_on(0, 2, 48),
            note_on(0, 5, 72),
            note_off(240, 2, 48),
            note_off(240, 5, 72),
        ])],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    assert_eq!(perf.track_names(), vec!["Track 3", "Track 6"]);
    assert_eq!(perf.tracks[0].notes[0].number, 48);
    assert_eq!(perf.tracks[1].notes[0].channel, 5);
}

#[test]
fn channel_addressed_name_goes_to_first_channel() {
    let bytes = smf(
        0,
        &[body(&[
            track_name(0, "Lead"),
            program(0, 4, 40),
            note_on(0, 0, 60),
            note_on(0, 4, 67),
            note_off(480, 0, 60),
            note_off(0, 4, 67),
        ])],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    assert_eq!(perf.track_names(), vec!["Lead", "Violin"]);
    assert_eq!(perf.find_track("Lead").unwrap().notes[0].channel, 0);
}

#[test]
fn naming_fallbacks_and_empty_tracks() {
    let bytes = smf(
        1,
        &[
            body(&[tempo(0, 500_000)]),
            body(&[program(0, 0, 40), note_on(0, 0, 67), note_off(480, 0, 67)]),
            body(&[track_name(0, "Bass"), program(0, 1, 33), note_on(0, 1, 36), note_off(480, 1, 36)]),
            body(&[program(0, 9, 0), note_on(0, 9, 38), note_off(120, 9, 38)]),
            body(&[note_on(0, 3, 50), note_off(120, 3, 50)]),
            body(&[]),
        ],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    assert_eq!(
        perf.track_names(),
        vec!["Violin", "Bass", "Drumset", "Track 5"]
    );
    assert_eq!(perf.find_track("Drumset").unwrap().all_used_notes(), vec![38]);
}

#[test]
fn pitch_bend_and_controllers() {
    let bytes = smf(
        0,
        &[body(&[
            event(0, &[0xE0, 0x00, 0x40]),
            event(240, &[0xE0, 0x00, 0x00]),
            event(0, &[0xB0, 64, 127]),
            event(0, &[0xD0, 90]),
        ])],
    );
    let perf = ingest_smf(&bytes, &mut NullSink).unwrap();
    let track = &perf.tracks[0];
    let bends: Vec<f64> = track.pitch_bend.iter().map(|e| e.value).collect();
    assert_eq!(bends, vec![0.0, -1.0]);
    assert_eq!(track.control_change[&64][0].value, 127.0);
    assert_eq!(track.control_change[&64][0].time, 0.25);
    assert_eq!(track.aftertouch[0].value, 90.0);
}

#[test]
fn unreleased_note_reports_warning() {
    let bytes = smf(1, &[body(&[note_on(0, 0, 60), note_on(960, 0, 62), note_off(0, 0, 62)])]);
    let mut diagnostics = FeedbackCollector::new();
    let perf = ingest_smf(&bytes, &mut diagnostics).unwrap();
    let held = &perf.tracks[0].notes[0];
    assert_eq!((held.number, held.time_off), (60, 1.0));
    assert_eq!(diagnostics.warnings().count(), 1);
}
