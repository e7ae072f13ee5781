//! Where scheduled keyframes go.

use crate::channel::ChannelPath;
use serde::{Deserialize, Serialize};

/// Receives keyframes and visibility toggles.
pub trait KeyframeSink {
    fn set_keyframe(&mut self, object: &str, channel: &ChannelPath, frame: f64, value: f64);

    fn set_visibility(&mut self, object: &str, frame: f64, visible: bool);
}

impl<S: KeyframeSink + ?Sized> KeyframeSink for &mut S {
    fn set_keyframe(&mut self, object: &str, channel: &ChannelPath, frame: f64, value: f64) {
        (**self).set_keyframe(object, channel, frame, value)
    }

    fn set_visibility(&mut self, object: &str, frame: f64, visible: bool) {
        (**self).set_visibility(object, frame, visible)
    }
}

/// One emitted output tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    Keyframe {
        object: String,
        channel: ChannelPath,
        frame: f64,
        value: f64,
    },
    Visibility {
        object: String,
        frame: f64,
        visible: bool,
    },
}

impl SinkEvent {
    pub fn object(&self) -> &str {
        match self {
            SinkEvent::Keyframe { object, .. } | SinkEvent::Visibility { object, .. } => object,
        }
    }

    pub fn frame(&self) -> f64 {
        match self {
            SinkEvent::Keyframe { frame, .. } | SinkEvent::Visibility { frame, .. } => *frame,
        }
    }
}

/// Keeps every event in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(frame, value)` pairs written to one channel of one object.
    pub fn keyframes(&self, object: &str, channel: &ChannelPath) -> Vec<(f64, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Keyframe {
                    object: o,
                    channel: c,
                    frame,
                    value,
                } if o == object && c == channel => Some((*frame, *value)),
                _ => None,
            })
            .collect()
    }

    /// `(frame, visible)` toggles for one object.
    pub fn visibility(&self, object: &str) -> Vec<(f64, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Visibility {
                    object: o,
                    frame,
                    visible,
                } if o == object => Some((*frame, *visible)),
                _ => None,
            })
            .collect()
    }

    pub fn objects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.events.iter().map(SinkEvent::object).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl KeyframeSink for RecordingSink {
    fn set_keyframe(&mut self, object: &str, channel: &ChannelPath, frame: f64, value: f64) {
        self.events.push(SinkEvent::Keyframe {
            object: object.to_string(),
            channel: channel.clone(),
            frame,
            value,
        });
    }

    fn set_visibility(&mut self, object: &str, frame: f64, visible: bool) {
        self.events.push(SinkEvent::Visibility {
            object: object.to_string(),
            frame,
            visible,
        });
    }
}

/// Shifts every frame by a constant before forwarding.
#[derive(Debug)]
pub struct OffsetSink<S> {
    inner: S,
    offset: f64,
}

impl<S: KeyframeSink> OffsetSink<S> {
    pub fn new(inner: S, offset: f64) -> Self {
        Self { inner, offset }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: KeyframeSink> KeyframeSink for OffsetSink<S> {
    fn set_keyframe(&mut self, object: &str, channel: &ChannelPath, frame: f64, value: f64) {
        self.inner
            .set_keyframe(object, channel, frame + self.offset, value)
    }

    fn set_visibility(&mut self, object: &str, frame: f64, visible: bool) {
        self.inner
            .set_visibility(object, frame + self.offset, visible)
    }
}

/// Counts what passes through on the way to another sink.
pub(crate) struct CountingSink<'a> {
    inner: &'a mut dyn KeyframeSink,
    pub keyframes: usize,
    pub visibility: usize,
}

impl<'a> CountingSink<'a> {
    pub fn new(inner: &'a mut dyn KeyframeSink) -> Self {
        Self {
            inner,
            keyframes: 0,
            visibility: 0,
        }
    }
}

impl KeyframeSink for CountingSink<'_> {
    fn set_keyframe(&mut self, object: &str, channel: &ChannelPath, frame: f64, value: f64) {
        self.keyframes += 1;
        self.inner.set_keyframe(object, channel, frame, value)
    }

    fn set_visibility(&mut self, object: &str, frame: f64, visible: bool) {
        self.visibility += 1;
        self.inner.set_visibility(object, frame, visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Axis;
    use pretty_assertions::assert_eq;

    #[test]
    fn offset_sink_shifts_frames() {
        let mut sink = OffsetSink::new(RecordingSink::new(), 100.0);
        let z = ChannelPath::Location(Axis::Z);
        sink.set_keyframe("ball", &z, -4.0, 1.5);
        sink.set_visibility("ball", -5.0, false);

        let rec = sink.into_inner();
        assert_eq!(rec.keyframes("ball", &z), vec![(96.0, 1.5)]);
        assert_eq!(rec.visibility("ball"), vec![(95.0, false)]);
        assert_eq!(rec.objects(), vec!["ball"]);
    }

    #[test]
    fn counting_sink_forwards() {
        let mut rec = RecordingSink::new();
        let mut counting = CountingSink::new(&mut rec);
        counting.set_keyframe("a", &ChannelPath::Property("glow".into()), 1.0, 0.5);
        counting.set_visibility("a", 1.0, true);
        assert_eq!((counting.keyframes, counting.visibility), (1, 1));
        assert_eq!(rec.events.len(), 2);
    }
}
