use crate::channel::ChannelPath;
use crate::{Error, Result};
use keycurves::Keyframe;
use serde::{Deserialize, Serialize};

/// One reference curve driving one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCurve {
    pub channel: ChannelPath,
    /// Frames relative to the template origin
    pub keys: Vec<Keyframe>,
}

impl ChannelCurve {
    pub fn new(channel: ChannelPath, mut keys: Vec<Keyframe>) -> Self {
        keycurves::keyframe::normalize(&mut keys);
        Self { channel, keys }
    }
}

/// Reference animation played once per note.
///
/// The extent is the smallest and largest key frame across all note-on
/// curves, computed once at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationTemplate {
    pub name: String,
    pub curves: Vec<ChannelCurve>,
    /// Played from the note's release instead of its onset
    pub release_curves: Vec<ChannelCurve>,
    /// Frames added to the release time before the release curves start
    pub release_offset: f64,
    min_offset: f64,
    max_offset: f64,
}

impl AnimationTemplate {
    pub fn new(
        name: impl Into<String>,
        curves: Vec<ChannelCurve>,
        release_curves: Vec<ChannelCurve>,
        release_offset: f64,
    ) -> Result<Self> {
        let name = name.into();
        // release curves only set the extent of a template without note-on curves
        let (min_offset, max_offset) = extent(&curves)
            .or_else(|| extent(&release_curves))
            .ok_or_else(|| Error::Scene(format!("template '{name}' has no keyframes")))?;

        Ok(Self {
            name,
            curves,
            release_curves,
            release_offset,
            min_offset,
            max_offset,
        })
    }

    pub fn min_offset(&self) -> f64 {
        self.min_offset
    }

    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }

    pub fn duration(&self) -> f64 {
        self.max_offset - self.min_offset
    }
}

fn extent(curves: &[ChannelCurve]) -> Option<(f64, f64)> {
    curves
        .iter()
        .filter_map(|c| keycurves::span(&c.keys))
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Axis;

    fn curve(channel: ChannelPath, points: &[(f64, f64)]) -> ChannelCurve {
        ChannelCurve::new(channel, points.iter().copied().map(Keyframe::from).collect())
    }

    #[test]
    fn extent_spans_all_curves() {
        let t = AnimationTemplate::new(
            "bounce",
            vec![
                curve(ChannelPath::Location(Axis::Z), &[(0.0, 0.0), (6.0, 1.0)]),
                curve(ChannelPath::Rotation(Axis::X), &[(-3.0, 0.0), (4.0, 1.0)]),
            ],
            Vec::new(),
            0.0,
        )
        .unwrap();
        assert_eq!((t.min_offset(), t.max_offset()), (-3.0, 6.0));
        assert_eq!(t.duration(), 9.0);
    }

    #[test]
    fn release_only_template_uses_release_extent() {
        let t = AnimationTemplate::new(
            "fade",
            Vec::new(),
            vec![curve(ChannelPath::Property("alpha".into()), &[(0.0, 1.0), (8.0, 0.0)])],
            2.0,
        )
        .unwrap();
        assert_eq!((t.min_offset(), t.max_offset()), (0.0, 8.0));
    }

    #[test]
    fn empty_template_is_rejected() {
        let err = AnimationTemplate::new("nothing", Vec::new(), Vec::new(), 0.0).unwrap_err();
        assert!(matches!(err, Error::Scene(_)));
    }

    #[test]
    fn curve_keys_are_sorted() {
        let c = curve(ChannelPath::Location(Axis::X), &[(4.0, 1.0), (0.0, 0.0)]);
        assert_eq!(c.keys[0].frame, 0.0);
    }
}
