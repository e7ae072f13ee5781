//! Merging a committed keyframe sequence with an incoming one.
//!
//! Every policy works on the overlap region
//! `[next.first, min(inserted.last, next.last)]`. Keys outside it pass
//! through untouched. The output is sorted with no two keys on one frame.

use crate::keyframe::{evaluate, normalize, Keyframe};
use crate::overlap::overlap_region;
use crate::{CurveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinePolicy {
    /// Superpose both curves
    #[default]
    Sum,
    Min,
    Max,
    /// The committed curve wins inside the overlap
    ReplacePrevious,
    /// The incoming curve wins from its first key on
    ReplaceNext,
    /// Both curves pulled halfway toward the rest value, then summed
    Crossfade,
    /// Drop a few trailing committed keys, then splice
    Prune,
}

impl CombinePolicy {
    pub const ALL: [CombinePolicy; 7] = [
        CombinePolicy::Sum,
        CombinePolicy::Min,
        CombinePolicy::Max,
        CombinePolicy::ReplacePrevious,
        CombinePolicy::ReplaceNext,
        CombinePolicy::Crossfade,
        CombinePolicy::Prune,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinePolicy::Sum => "sum",
            CombinePolicy::Min => "min",
            CombinePolicy::Max => "max",
            CombinePolicy::ReplacePrevious => "replace_previous",
            CombinePolicy::ReplaceNext => "replace_next",
            CombinePolicy::Crossfade => "crossfade",
            CombinePolicy::Prune => "prune",
        }
    }
}

impl fmt::Display for CombinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinePolicy {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        CombinePolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| CurveError::UnknownPolicy(s.to_string()))
    }
}

/// A policy plus the parameters some policies need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combiner {
    pub policy: CombinePolicy,
    /// Neutral value used by [`CombinePolicy::Crossfade`]
    pub rest_value: f64,
    /// Trailing keys dropped by [`CombinePolicy::Prune`]
    pub prune_count: usize,
}

impl Default for Combiner {
    fn default() -> Self {
        Self {
            policy: CombinePolicy::Sum,
            rest_value: 0.0,
            prune_count: 2,
        }
    }
}

impl Combiner {
    pub fn new(policy: CombinePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Merge `next` into `inserted`.
    ///
    /// An empty `next` returns `inserted` unchanged and an empty `inserted`
    /// returns `next`. Fails when `inserted` starts after `next`.
    pub fn combine(&self, inserted: &[Keyframe], next: &[Keyframe]) -> Result<Vec<Keyframe>> {
        if next.is_empty() {
            return Ok(inserted.to_vec());
        }
        if inserted.is_empty() {
            return Ok(next.to_vec());
        }

        let region = overlap_region(inserted, next)?;
        let Some((lo, hi)) = region else {
            let mut out = inserted.to_vec();
            out.extend_from_slice(next);
            normalize(&mut out);
            return Ok(out);
        };
        let inside = |k: &Keyframe| k.frame >= lo && k.frame <= hi;

        let mut out = match self.policy {
            CombinePolicy::Sum => reduce(inserted, next, inside, |a, b| a + b),
            CombinePolicy::Min => reduce(inserted, next, inside, f64::min),
            CombinePolicy::Max => reduce(inserted, next, inside, f64::max),
            CombinePolicy::Crossfade => {
                let rest = self.rest_value;
                reduce(inserted, next, inside, |a, b| {
                    rest + ((a - rest) + (b - rest)) / 2.0
                })
            }
            CombinePolicy::ReplacePrevious => {
                let i_last = inserted[inserted.len() - 1].frame;
                inserted
                    .iter()
                    .chain(next.iter().filter(|k| k.frame > i_last))
                    .copied()
                    .collect()
            }
            CombinePolicy::ReplaceNext => inserted
                .iter()
                .filter(|k| k.frame < lo)
                .chain(next)
                .copied()
                .collect(),
            CombinePolicy::Prune => {
                let overlapping = inserted.iter().rev().take_while(|k| k.frame >= lo).count();
                let keep = inserted.len() - overlapping.min(self.prune_count);
                // next first, so it wins ties in normalize
                next.iter().chain(&inserted[..keep]).copied().collect()
            }
        };

        normalize(&mut out);
        tracing::trace!(
            policy = %self.policy,
            lo,
            hi,
            keys = out.len(),
            "combined keyframe sequences"
        );
        Ok(out)
    }

    /// In-place form of [`Combiner::combine`].
    pub fn combine_into(&self, inserted: &mut Vec<Keyframe>, next: &[Keyframe]) -> Result<()> {
        if next.is_empty() {
            return Ok(());
        }
        *inserted = self.combine(inserted, next)?;
        Ok(())
    }

    /// Fold many sequences in order of their first frame.
    pub fn combine_all<I>(&self, sequences: I) -> Result<Vec<Keyframe>>
    where
        I: IntoIterator<Item = Vec<Keyframe>>,
    {
        let mut sequences: Vec<Vec<Keyframe>> =
            sequences.into_iter().filter(|s| !s.is_empty()).collect();
        sequences.sort_by(|a, b| a[0].frame.total_cmp(&b[0].frame));

        let mut acc = Vec::new();
        for seq in &sequences {
            self.combine_into(&mut acc, seq)?;
        }
        Ok(acc)
    }
}

/// Keys inside the region take `op(inserted value, next value)`, with the
/// missing side evaluated from the other curve.
fn reduce(
    inserted: &[Keyframe],
    next: &[Keyframe],
    inside: impl Fn(&Keyframe) -> bool,
    op: impl Fn(f64, f64) -> f64,
) -> Vec<Keyframe> {
    let from_inserted = inserted.iter().map(|k| {
        if inside(k) {
            let other = evaluate(next, k.frame).unwrap_or(0.0);
            Keyframe::new(k.frame, op(k.value, other))
        } else {
            *k
        }
    });
    let from_next = next.iter().map(|k| {
        if inside(k) {
            let other = evaluate(inserted, k.frame).unwrap_or(0.0);
            Keyframe::new(k.frame, op(other, k.value))
        } else {
            *k
        }
    });
    from_inserted.chain(from_next).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::is_strictly_ascending;
    use pretty_assertions::assert_eq;

    fn seq(points: &[(f64, f64)]) -> Vec<Keyframe> {
        points.iter().copied().map(Keyframe::from).collect()
    }

    fn combine(policy: CombinePolicy, a: &[Keyframe], b: &[Keyframe]) -> Vec<Keyframe> {
        Combiner::new(policy).combine(a, b).unwrap()
    }

    fn committed() -> Vec<Keyframe> {
        seq(&[(0.0, 0.0), (4.0, 1.0), (8.0, 0.0)])
    }

    fn incoming() -> Vec<Keyframe> {
        seq(&[(6.0, 0.0), (10.0, 1.0), (14.0, 0.0)])
    }

    #[test]
    fn empty_next_is_identity_for_every_policy() {
        let s = seq(&[(0.0, 1.0), (2.0, 3.0), (2.0, 4.0), (5.0, 0.0)]);
        for policy in CombinePolicy::ALL {
            assert_eq!(combine(policy, &s, &[]), s, "{policy}");
        }
    }

    #[test]
    fn empty_inserted_takes_next() {
        for policy in CombinePolicy::ALL {
            assert_eq!(combine(policy, &[], &incoming()), incoming(), "{policy}");
        }
    }

    #[test]
    fn sum_over_overlap() {
        // overlap region is [6, 8]
        let out = combine(CombinePolicy::Sum, &committed(), &incoming());
        assert_eq!(
            out,
            seq(&[(0.0, 0.0), (4.0, 1.0), (6.0, 0.5), (8.0, 0.5), (10.0, 1.0), (14.0, 0.0)])
        );
    }

    #[test]
    fn min_and_max() {
        let max = combine(CombinePolicy::Max, &committed(), &incoming());
        assert_eq!(max[2], Keyframe::new(6.0, 0.5));
        assert_eq!(max[3], Keyframe::new(8.0, 0.5));

        let min = combine(CombinePolicy::Min, &committed(), &incoming());
        assert_eq!(min[2], Keyframe::new(6.0, 0.0));
        assert_eq!(min[3], Keyframe::new(8.0, 0.0));
    }

    #[test]
    fn crossfade_through_rest() {
        let combiner = Combiner {
            policy: CombinePolicy::Crossfade,
            rest_value: 1.0,
            prune_count: 2,
        };
        let a = seq(&[(0.0, 1.0), (10.0, 3.0)]);
        let b = seq(&[(0.0, 5.0), (10.0, 1.0)]);
        let out = combiner.combine(&a, &b).unwrap();
        // 1 + ((1 - 1) + (5 - 1)) / 2, then 1 + ((3 - 1) + (1 - 1)) / 2
        assert_eq!(out, seq(&[(0.0, 3.0), (10.0, 2.0)]));
    }

    #[test]
    fn replace_previous_keeps_committed_region() {
        let out = combine(CombinePolicy::ReplacePrevious, &committed(), &incoming());
        assert_eq!(
            out,
            seq(&[(0.0, 0.0), (4.0, 1.0), (8.0, 0.0), (10.0, 1.0), (14.0, 0.0)])
        );
    }

    #[test]
    fn replace_next_takes_incoming_from_its_start() {
        let out = combine(CombinePolicy::ReplaceNext, &committed(), &incoming());
        assert_eq!(
            out,
            seq(&[(0.0, 0.0), (4.0, 1.0), (6.0, 0.0), (10.0, 1.0), (14.0, 0.0)])
        );
    }

    #[test]
    fn prune_drops_trailing_keys() {
        let a = seq(&[(0.0, 0.0), (4.0, 1.0), (7.0, 0.6), (9.0, 0.3), (12.0, 0.0)]);
        let b = seq(&[(6.0, 0.0), (10.0, 1.0)]);

        let out = combine(CombinePolicy::Prune, &a, &b);
        assert_eq!(
            out,
            seq(&[(0.0, 0.0), (4.0, 1.0), (6.0, 0.0), (7.0, 0.6), (10.0, 1.0)])
        );

        let one = Combiner {
            prune_count: 1,
            ..Combiner::new(CombinePolicy::Prune)
        };
        assert_eq!(one.combine(&a, &b).unwrap().len(), 6);
    }

    #[test]
    fn sum_is_order_independent_on_overlap() {
        let a = seq(&[(0.0, 0.2), (3.0, 1.0), (9.0, 0.0)]);
        let b = seq(&[(0.0, 0.5), (5.0, 0.25), (7.0, 0.75), (12.0, 0.0)]);

        let ab = combine(CombinePolicy::Sum, &a, &b);
        let ba = combine(CombinePolicy::Sum, &b, &a);

        let overlap = |s: &[Keyframe]| -> Vec<Keyframe> {
            s.iter().copied().filter(|k| k.frame <= 9.0).collect()
        };
        assert_eq!(overlap(&ab), overlap(&ba));
        for frame in [0.0, 1.5, 3.0, 6.0, 8.0, 9.0] {
            let x = evaluate(&ab, frame).unwrap();
            let y = evaluate(&ba, frame).unwrap();
            assert!((x - y).abs() < 1e-12, "frame {frame}: {x} vs {y}");
        }
    }

    #[test]
    fn output_is_strictly_ascending() {
        for policy in CombinePolicy::ALL {
            let out = combine(policy, &committed(), &incoming());
            assert!(is_strictly_ascending(&out), "{policy}: {out:?}");
        }
    }

    #[test]
    fn time_reversal_propagates() {
        let err = Combiner::default()
            .combine(&incoming(), &committed())
            .unwrap_err();
        assert!(matches!(err, CurveError::TimeReversed { .. }));
    }

    #[test]
    fn combine_all_sorts_by_start() {
        let out = Combiner::default()
            .combine_all(vec![incoming(), Vec::new(), committed()])
            .unwrap();
        assert_eq!(out, combine(CombinePolicy::Sum, &committed(), &incoming()));
    }

    #[test]
    fn policy_names() {
        assert_eq!("replace-next".parse::<CombinePolicy>().unwrap(), CombinePolicy::ReplaceNext);
        assert_eq!(" SUM ".parse::<CombinePolicy>().unwrap(), CombinePolicy::Sum);
        assert!("blend".parse::<CombinePolicy>().is_err());
    }
}
