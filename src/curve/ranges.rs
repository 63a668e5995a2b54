//! Rectangle decomposition into curve index ranges.
//!
//! A curve of order `k` is four order-`k-1` sub-curves, one per sub-quadrant,
//! each a rotation/reflection of the base shape. Decomposition recurses into
//! the sub-quadrants a rectangle touches, in the order the current curve
//! variant traverses them, so emitted intervals ascend by construction.

use crate::error::{GeocurveError, Result};
use crate::types::{GridRect, Range};

/// One of the four rotations/reflections of the base unit curve.
///
/// `A` is the identity shape: it enters at the lower-left corner, rises, and
/// exits at the lower-right. `B` is its transpose, `C` the 180-degree
/// rotation, `D` the anti-transpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    A,
    B,
    C,
    D,
}

/// Geometric sub-quadrant of a square, in grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    LowerLeft,
    UpperLeft,
    UpperRight,
    LowerRight,
}

impl Quadrant {
    /// Lower-left corner of the sub-quadrant within a square split at `half`.
    const fn origin(self, half: u64) -> (u64, u64) {
        match self {
            Quadrant::LowerLeft => (0, 0),
            Quadrant::UpperLeft => (0, half),
            Quadrant::UpperRight => (half, half),
            Quadrant::LowerRight => (half, 0),
        }
    }
}

impl Orientation {
    /// Sub-quadrants in the order this curve variant traverses them.
    const fn traversal(self) -> [Quadrant; 4] {
        match self {
            Orientation::A => [
                Quadrant::LowerLeft,
                Quadrant::UpperLeft,
                Quadrant::UpperRight,
                Quadrant::LowerRight,
            ],
            Orientation::B => [
                Quadrant::LowerLeft,
                Quadrant::LowerRight,
                Quadrant::UpperRight,
                Quadrant::UpperLeft,
            ],
            Orientation::C => [
                Quadrant::UpperRight,
                Quadrant::LowerRight,
                Quadrant::LowerLeft,
                Quadrant::UpperLeft,
            ],
            Orientation::D => [
                Quadrant::UpperRight,
                Quadrant::UpperLeft,
                Quadrant::LowerLeft,
                Quadrant::LowerRight,
            ],
        }
    }

    /// Orientations of the four sub-curves, positionally matching
    /// [`Orientation::traversal`].
    const fn children(self) -> [Orientation; 4] {
        match self {
            Orientation::A => [
                Orientation::B,
                Orientation::A,
                Orientation::A,
                Orientation::D,
            ],
            Orientation::B => [
                Orientation::A,
                Orientation::B,
                Orientation::B,
                Orientation::C,
            ],
            Orientation::C => [
                Orientation::D,
                Orientation::C,
                Orientation::C,
                Orientation::B,
            ],
            Orientation::D => [
                Orientation::C,
                Orientation::D,
                Orientation::D,
                Orientation::A,
            ],
        }
    }
}

/// An in-world rectangle in the local coordinates of the square being split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellRect {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub height: u64,
}

impl CellRect {
    /// Convert a wrapped, in-world [`GridRect`].
    pub fn from_grid(rect: &GridRect) -> Self {
        Self {
            x: rect.x as u64,
            y: rect.y as u64,
            width: rect.width as u64,
            height: rect.height as u64,
        }
    }
}

/// Accumulates intervals in ascending order, fusing exactly-adjacent ones.
#[derive(Debug, Default)]
pub(crate) struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    pub fn push(&mut self, lo: u64, hi: u64) {
        if let Some(last) = self.ranges.last_mut()
            && last.hi + 1 == lo
        {
            last.hi = hi;
        } else {
            self.ranges.push(Range { lo, hi });
        }
    }

    pub fn into_ranges(self) -> Vec<Range> {
        self.ranges
    }
}

/// Decompose `rect` against the order-`log2(t)` curve variant `orientation`
/// occupying the `t x t` square whose first index is `base`.
///
/// `rect` must lie within the square. Intervals are emitted into `out` in
/// ascending index order.
pub(crate) fn split_quad(
    orientation: Orientation,
    t: u64,
    base: u64,
    rect: CellRect,
    out: &mut RangeSet,
) {
    // The rectangle fills the square: the whole sub-curve is covered.
    if rect.width == t && rect.height == t {
        out.push(base, base + t * t - 1);
        return;
    }
    if t == 1 {
        return;
    }

    let half = t / 2;
    let sub_len = half * half;
    let traversal = orientation.traversal();
    let children = orientation.children();

    for step in 0..4 {
        let (ox, oy) = traversal[step].origin(half);

        let x0 = rect.x.max(ox);
        let x1 = (rect.x + rect.width).min(ox + half);
        if x1 <= x0 {
            continue;
        }
        let y0 = rect.y.max(oy);
        let y1 = (rect.y + rect.height).min(oy + half);
        if y1 <= y0 {
            continue;
        }

        split_quad(
            children[step],
            half,
            base + step as u64 * sub_len,
            CellRect {
                x: x0 - ox,
                y: y0 - oy,
                width: x1 - x0,
                height: y1 - y0,
            },
            out,
        );
    }
}

/// Reconcile a raw grid rectangle with the `n x n` world.
///
/// Longitudinal overshoot wraps across the antimeridian, splitting the
/// rectangle in two; latitudinal overshoot is truncated at the poles (a
/// latitudinal wrap would re-enter the opposite longitude half, which is not
/// the same place). Returns the in-world pieces, or `OutOfWorld` when
/// nothing remains.
pub(crate) fn wrap_rect(rect: &GridRect, n: i64) -> Result<Vec<GridRect>> {
    let mut x = rect.x;
    let q = rect.width.max(1);
    let mut y = rect.y;
    let mut p = rect.height.max(1);

    // Rectangles whose origin lies a full world away shift into the
    // (-n, n) window first so the two-piece split below applies.
    while x >= n {
        x -= n;
    }
    while x + q <= 0 {
        x += n;
    }

    // Pole clipping.
    if y < 0 {
        p += y;
        y = 0;
    }
    if y + p > n {
        p = n - y;
    }
    if p <= 0 || y >= n {
        return Err(GeocurveError::OutOfWorld);
    }

    let mut pieces: Vec<GridRect> = Vec::with_capacity(2);
    if x < 0 && x + q > n {
        // Wider than the world after wrapping: the whole band.
        pieces.push(GridRect { x: 0, y, width: n, height: p });
    } else if x < 0 {
        if q + x > 0 {
            pieces.push(GridRect { x: 0, y, width: q + x, height: p });
        }
        if n - 1 + x >= 0 {
            pieces.push(GridRect { x: n - 1 + x, y, width: -x, height: p });
        }
    } else if x + q > n {
        pieces.push(GridRect { x, y, width: n - x, height: p });
        pieces.push(GridRect { x: 0, y, width: x + q - n, height: p });
    } else {
        pieces.push(GridRect { x, y, width: q, height: p });
    }

    pieces.retain_mut(|piece| {
        if piece.x + piece.width > n {
            piece.width = n - piece.x;
        }
        piece.width > 0 && piece.height > 0
    });

    if pieces.is_empty() {
        return Err(GeocurveError::OutOfWorld);
    }
    Ok(pieces)
}

/// Sort a range list ascending and fuse overlapping or adjacent entries.
///
/// Decomposing several wrapped pieces can interleave their intervals; this
/// restores the strictly-ascending, non-overlapping form.
pub(crate) fn normalize_ranges(ranges: &mut Vec<Range>) {
    if ranges.len() < 2 {
        return;
    }
    ranges.sort_unstable();

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    let mut current = ranges[0];
    for range in &ranges[1..] {
        if range.lo <= current.hi + 1 {
            current.hi = current.hi.max(range.hi);
        } else {
            merged.push(current);
            current = *range;
        }
    }
    merged.push(current);
    *ranges = merged;
}

/// Merge nearly-adjacent ranges until at most `max_ranges` remain.
///
/// Each pass fuses consecutive ranges whose gap is at most the current
/// tolerance; the next tolerance is the smallest gap that survived the pass.
/// Merging across a gap enlarges coverage, so callers that filter hits by
/// exact distance see false positives, never false negatives.
///
/// # Errors
///
/// [`GeocurveError::EmptyRanges`] when called on an empty list; an empty
/// search result is valid data, so asking to compact one is a caller bug.
pub fn compact_ranges(ranges: &mut Vec<Range>, max_ranges: usize) -> Result<()> {
    if ranges.is_empty() {
        return Err(GeocurveError::EmptyRanges);
    }

    let mut tolerance: u64 = 1;
    let mut passes = 0u32;
    while ranges.len() > max_ranges {
        let mut next_tolerance: Option<u64> = None;
        let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
        let mut current = ranges[0];

        for range in &ranges[1..] {
            let gap = range.lo.saturating_sub(current.hi + 1);
            if gap <= tolerance {
                current.hi = range.hi;
            } else {
                if next_tolerance.is_none_or(|t| gap < t) {
                    next_tolerance = Some(gap);
                }
                merged.push(current);
                current = *range;
            }
        }
        merged.push(current);
        *ranges = merged;
        passes += 1;

        match next_tolerance {
            Some(t) => tolerance = t,
            None => break,
        }
    }

    log::debug!(
        "compacted to {} ranges in {} passes (tolerance {})",
        ranges.len(),
        passes,
        tolerance
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decompose(side: u64, rect: CellRect) -> Vec<Range> {
        let mut set = RangeSet::default();
        split_quad(Orientation::A, side, 0, rect, &mut set);
        set.into_ranges()
    }

    #[test]
    fn test_full_square_is_one_range() {
        let ranges = decompose(4, CellRect { x: 0, y: 0, width: 4, height: 4 });
        assert_eq!(ranges, vec![Range { lo: 0, hi: 15 }]);
    }

    #[test]
    fn test_quadrant_is_one_range() {
        // Lower-right quadrant of the order-2 curve holds indices 12..=15.
        let ranges = decompose(4, CellRect { x: 2, y: 0, width: 2, height: 2 });
        assert_eq!(ranges, vec![Range { lo: 12, hi: 15 }]);
    }

    #[test]
    fn test_bottom_row_pair() {
        // Cells (1,0) and (2,0) sit on different sub-curves: indices 1 and 14.
        let ranges = decompose(4, CellRect { x: 1, y: 0, width: 2, height: 1 });
        assert_eq!(
            ranges,
            vec![Range { lo: 1, hi: 1 }, Range { lo: 14, hi: 14 }]
        );
    }

    #[test]
    fn test_left_column_is_contiguous() {
        // West column of the order-2 curve: (0,0)=0, (0,1)=3, (0,2)=4, (0,3)=5.
        let ranges = decompose(4, CellRect { x: 0, y: 0, width: 1, height: 4 });
        assert_eq!(
            ranges,
            vec![Range { lo: 0, hi: 0 }, Range { lo: 3, hi: 5 }]
        );
    }

    #[test]
    fn test_ranges_are_sorted_disjoint_nonadjacent() {
        for side in [4u64, 8, 16] {
            for (x, y, w, h) in [(1, 1, 3, 2), (0, 2, 2, 2), (2, 0, 1, 3)] {
                let ranges = decompose(side, CellRect { x, y, width: w, height: h });
                assert!(!ranges.is_empty());
                for pair in ranges.windows(2) {
                    assert!(
                        pair[0].hi + 1 < pair[1].lo,
                        "ranges not separated on side {side}: {pair:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cover_is_exact() {
        // Without compaction, covered index count equals the cell count.
        for (x, y, w, h) in [(0, 0, 8, 8), (3, 5, 2, 3), (1, 0, 7, 4), (6, 6, 2, 2)] {
            let ranges = decompose(8, CellRect { x, y, width: w, height: h });
            let covered: u64 = ranges.iter().map(Range::len).sum();
            assert_eq!(covered, w * h, "rect ({x},{y},{w},{h})");
        }
    }

    #[test]
    fn test_range_set_fuses_adjacent() {
        let mut set = RangeSet::default();
        set.push(0, 3);
        set.push(4, 7);
        set.push(9, 9);
        assert_eq!(
            set.into_ranges(),
            vec![Range { lo: 0, hi: 7 }, Range { lo: 9, hi: 9 }]
        );
    }

    #[test]
    fn test_wrap_passthrough() {
        let rect = GridRect::new(3, 4, 2, 2);
        let pieces = wrap_rect(&rect, 16).unwrap();
        assert_eq!(pieces, vec![rect]);
    }

    #[test]
    fn test_wrap_west() {
        let pieces = wrap_rect(&GridRect::new(-2, 4, 5, 2), 16).unwrap();
        assert_eq!(
            pieces,
            vec![
                GridRect { x: 0, y: 4, width: 3, height: 2 },
                GridRect { x: 13, y: 4, width: 2, height: 2 },
            ]
        );
    }

    #[test]
    fn test_wrap_east() {
        let pieces = wrap_rect(&GridRect::new(14, 0, 5, 1), 16).unwrap();
        assert_eq!(
            pieces,
            vec![
                GridRect { x: 14, y: 0, width: 2, height: 1 },
                GridRect { x: 0, y: 0, width: 3, height: 1 },
            ]
        );
    }

    #[test]
    fn test_wrap_wider_than_world_clamps_to_band() {
        let pieces = wrap_rect(&GridRect::new(-10, 2, 40, 3), 16).unwrap();
        assert_eq!(pieces, vec![GridRect { x: 0, y: 2, width: 16, height: 3 }]);
    }

    #[test]
    fn test_wrap_clips_at_poles() {
        let pieces = wrap_rect(&GridRect::new(1, -3, 2, 5), 16).unwrap();
        assert_eq!(pieces, vec![GridRect { x: 1, y: 0, width: 2, height: 2 }]);

        let pieces = wrap_rect(&GridRect::new(1, 14, 2, 5), 16).unwrap();
        assert_eq!(pieces, vec![GridRect { x: 1, y: 14, width: 2, height: 2 }]);
    }

    #[test]
    fn test_wrap_rejects_out_of_world() {
        assert_eq!(
            wrap_rect(&GridRect::new(3, 20, 2, 2), 16),
            Err(GeocurveError::OutOfWorld)
        );
        assert_eq!(
            wrap_rect(&GridRect::new(3, -20, 2, 2), 16),
            Err(GeocurveError::OutOfWorld)
        );
    }

    #[test]
    fn test_normalize_merges_interleaved() {
        let mut ranges = vec![
            Range { lo: 10, hi: 12 },
            Range { lo: 0, hi: 4 },
            Range { lo: 5, hi: 6 },
            Range { lo: 11, hi: 15 },
        ];
        normalize_ranges(&mut ranges);
        assert_eq!(
            ranges,
            vec![Range { lo: 0, hi: 6 }, Range { lo: 10, hi: 15 }]
        );
    }

    #[test]
    fn test_compaction_escalates_tolerance() {
        let mut ranges = vec![
            Range { lo: 0, hi: 1 },
            Range { lo: 4, hi: 5 },
            Range { lo: 10, hi: 11 },
            Range { lo: 100, hi: 101 },
        ];
        compact_ranges(&mut ranges, 2).unwrap();
        assert_eq!(
            ranges,
            vec![Range { lo: 0, hi: 11 }, Range { lo: 100, hi: 101 }]
        );
    }

    #[test]
    fn test_compaction_noop_when_under_target() {
        let mut ranges = vec![Range { lo: 0, hi: 1 }, Range { lo: 50, hi: 51 }];
        compact_ranges(&mut ranges, 8).unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_compaction_of_empty_list_is_an_error() {
        let mut ranges = Vec::new();
        assert_eq!(
            compact_ranges(&mut ranges, 4),
            Err(GeocurveError::EmptyRanges)
        );
    }
}
