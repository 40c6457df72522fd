//! # Render Range Splitting
//!
//! Partitions the static sequence at dynamic insertion points:
//!
//! ```text
//! sequence:  [0 ........ 4 ............ 9 ...... n)
//! points:               ^4              ^9
//! ranges:    Static(0,4) Splice(4) Static(4,5) Splice(9) Static(9,n-9)
//! ```
//!
//! Several objects at the same index share one splice marker; they are
//! recovered through the injector's range query.

use crate::injection::InsertionPoint;
use crate::instance::InstanceRecord;

/// What a render range holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Contiguous static instances.
    StaticRun,
    /// Marker where dynamic objects are drawn. Always empty.
    DynamicSplice,
}

/// A slice of the static sequence, or a splice marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRange {
    /// First sequence index.
    pub start: usize,
    /// Number of static instances.
    pub count: usize,
    /// Range kind.
    pub kind: RangeKind,
    /// Depth-sort anchor. For static runs, the world position of the last
    /// instance; for splices, the first dynamic object's position.
    pub anchor: [f32; 3],
}

impl RenderRange {
    /// One past the last index.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.count
    }

    /// Returns true for a static run.
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == RangeKind::StaticRun
    }
}

/// Splits `sequence` at `points` into alternating static runs and splices.
///
/// Points beyond the sequence length are ignored; duplicate indices collapse
/// into one splice. Ranges are appended to `out` in sequence order and the
/// static runs together cover `[0, n)` exactly once.
///
/// `scratch` holds the ordered points. It is cleared on entry and keeps its
/// allocation across frames.
pub fn split_render_ranges<E>(
    sequence: &[InstanceRecord],
    points: &[InsertionPoint],
    scratch: &mut Vec<InsertionPoint>,
    out: &mut E,
) where
    E: Extend<RenderRange>,
{
    let n = sequence.len();

    scratch.clear();
    scratch.extend(points.iter().filter(|p| p.index <= n).copied());
    // Stable sort: the first object registered at an index anchors its splice.
    scratch.sort_by_key(|p| p.index);
    scratch.dedup_by_key(|p| p.index);

    let mut cursor = 0;
    for point in scratch.iter() {
        if point.index > cursor {
            out.extend(Some(static_run(sequence, cursor, point.index)));
            cursor = point.index;
        }
        out.extend(Some(RenderRange {
            start: point.index,
            count: 0,
            kind: RangeKind::DynamicSplice,
            anchor: point.position,
        }));
    }

    if cursor < n {
        out.extend(Some(static_run(sequence, cursor, n)));
    }
}

fn static_run(sequence: &[InstanceRecord], start: usize, end: usize) -> RenderRange {
    RenderRange {
        start,
        count: end - start,
        kind: RangeKind::StaticRun,
        anchor: sequence[end - 1].world_position,
    }
}
