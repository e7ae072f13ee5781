use serde::{Deserialize, Serialize};

/// A point on a piecewise-linear curve.
///
/// Serialized as a `[frame, value]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Keyframe {
    pub frame: f64,
    pub value: f64,
}

impl Keyframe {
    pub fn new(frame: f64, value: f64) -> Self {
        Self { frame, value }
    }
}

impl From<(f64, f64)> for Keyframe {
    fn from((frame, value): (f64, f64)) -> Self {
        Self { frame, value }
    }
}

impl From<Keyframe> for (f64, f64) {
    fn from(k: Keyframe) -> Self {
        (k.frame, k.value)
    }
}

/// Value on the segment k1-k2 at `frame`. A zero-width segment is flat at k1.
pub fn interpolate(k1: Keyframe, k2: Keyframe, frame: f64) -> f64 {
    let slope = if k1.frame == k2.frame {
        0.0
    } else {
        (k2.value - k1.value) / (k2.frame - k1.frame)
    };
    k1.value + slope * (frame - k1.frame)
}

/// The keys bracketing `frame`.
///
/// Before the sequence this is `(first, first)`, at or after the last key it
/// is `(last, last)`, otherwise the adjacent pair with
/// `k1.frame <= frame < k2.frame`. `None` for an empty sequence.
pub fn interval_for(seq: &[Keyframe], frame: f64) -> Option<(Keyframe, Keyframe)> {
    let first = *seq.first()?;
    let last = *seq.last()?;
    let after = seq.partition_point(|k| k.frame <= frame);
    Some(match after {
        0 => (first, first),
        n if n == seq.len() => (last, last),
        n => (seq[n - 1], seq[n]),
    })
}

/// Curve value at `frame`, held flat beyond either end.
pub fn evaluate(seq: &[Keyframe], frame: f64) -> Option<f64> {
    interval_for(seq, frame).map(|(k1, k2)| interpolate(k1, k2, frame))
}

/// First and last frame.
pub fn span(seq: &[Keyframe]) -> Option<(f64, f64)> {
    Some((seq.first()?.frame, seq.last()?.frame))
}

/// Copy of `seq` moved by `offset` frames with every value multiplied by `scale`.
pub fn shifted(seq: &[Keyframe], offset: f64, scale: f64) -> Vec<Keyframe> {
    seq.iter()
        .map(|k| Keyframe::new(k.frame + offset, k.value * scale))
        .collect()
}

/// Sort by frame, keeping the first of any keys that share a frame.
pub fn normalize(seq: &mut Vec<Keyframe>) {
    seq.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    seq.dedup_by(|later, earlier| later.frame == earlier.frame);
}

pub fn is_strictly_ascending(seq: &[Keyframe]) -> bool {
    seq.windows(2).all(|w| w[0].frame < w[1].frame)
}
