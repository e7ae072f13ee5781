use crate::keyframe::Keyframe;
use crate::{CurveError, Result};

fn check_order(inserted: &[Keyframe], next: &[Keyframe]) -> Result<()> {
    if let (Some(i), Some(n)) = (inserted.first(), next.first()) {
        if i.frame > n.frame {
            return Err(CurveError::TimeReversed {
                inserted_start: i.frame,
                next_start: n.frame,
            });
        }
    }
    Ok(())
}

/// The keys of `inserted` lying strictly after the first key of `next`.
///
/// Empty when either sequence is empty or they do not overlap. Fails when
/// `inserted` starts after `next`.
pub fn find_overlap<'a>(inserted: &'a [Keyframe], next: &[Keyframe]) -> Result<&'a [Keyframe]> {
    check_order(inserted, next)?;
    let Some(start) = next.first() else {
        return Ok(&[]);
    };
    let from = inserted.partition_point(|k| k.frame <= start.frame);
    Ok(&inserted[from..])
}

/// [`find_overlap`] plus the key of `inserted` just before it, so the
/// window can be interpolated at `next`'s first frame.
pub fn overlap_window<'a>(inserted: &'a [Keyframe], next: &[Keyframe]) -> Result<&'a [Keyframe]> {
    let suffix = find_overlap(inserted, next)?;
    if suffix.is_empty() {
        return Ok(suffix);
    }
    let from = inserted.len() - suffix.len();
    Ok(&inserted[from.saturating_sub(1)..])
}

/// Closed frame interval where both sequences are defined:
/// `[next.first, min(inserted.last, next.last)]`.
pub fn overlap_region(inserted: &[Keyframe], next: &[Keyframe]) -> Result<Option<(f64, f64)>> {
    check_order(inserted, next)?;
    let (Some(i_last), Some(n_first), Some(n_last)) = (inserted.last(), next.first(), next.last())
    else {
        return Ok(None);
    };
    let end = i_last.frame.min(n_last.frame);
    Ok((n_first.frame <= end).then_some((n_first.frame, end)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seq(points: &[(f64, f64)]) -> Vec<Keyframe> {
        points.iter().copied().map(Keyframe::from).collect()
    }

    #[test]
    fn suffix_after_next_start() {
        let inserted = seq(&[(0.0, 0.0), (4.0, 1.0), (8.0, 0.5), (12.0, 0.0)]);
        let next = seq(&[(6.0, 0.0), (10.0, 1.0)]);
        assert_eq!(find_overlap(&inserted, &next).unwrap(), &inserted[2..]);
        assert_eq!(overlap_window(&inserted, &next).unwrap(), &inserted[1..]);
    }

    #[test]
    fn key_on_boundary_is_not_overlap() {
        let inserted = seq(&[(0.0, 0.0), (6.0, 1.0)]);
        let next = seq(&[(6.0, 0.0), (10.0, 1.0)]);
        assert!(find_overlap(&inserted, &next).unwrap().is_empty());
        assert_eq!(overlap_region(&inserted, &next).unwrap(), Some((6.0, 6.0)));
    }

    #[test]
    fn disjoint_sequences() {
        let inserted = seq(&[(0.0, 0.0), (2.0, 1.0)]);
        let next = seq(&[(6.0, 0.0), (10.0, 1.0)]);
        assert!(find_overlap(&inserted, &next).unwrap().is_empty());
        assert_eq!(overlap_region(&inserted, &next).unwrap(), None);
    }

    #[test]
    fn time_running_backward_fails() {
        let inserted = seq(&[(5.0, 0.0), (9.0, 1.0)]);
        let next = seq(&[(2.0, 0.0)]);
        assert!(matches!(
            find_overlap(&inserted, &next),
            Err(CurveError::TimeReversed {
                inserted_start,
                next_start,
            }) if inserted_start == 5.0 && next_start == 2.0
        ));
    }

    #[test]
    fn region_is_bounded_by_shorter_end() {
        let inserted = seq(&[(0.0, 0.0), (20.0, 0.0)]);
        let next = seq(&[(5.0, 1.0), (9.0, 0.0)]);
        assert_eq!(overlap_region(&inserted, &next).unwrap(), Some((5.0, 9.0)));
    }
}
