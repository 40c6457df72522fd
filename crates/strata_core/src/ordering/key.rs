//! Sort keys and the ordering relation.

use std::cmp::Ordering;

/// The two-part key every drawable is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SortKey {
    /// Combined sorting layer and in-layer order. Primary key.
    pub layer_and_order: i32,
    /// Camera-relative depth value. Secondary key.
    pub distance: f32,
}

impl SortKey {
    /// Creates a new sort key.
    #[inline]
    #[must_use]
    pub const fn new(layer_and_order: i32, distance: f32) -> Self {
        Self {
            layer_and_order,
            distance,
        }
    }
}

/// Anything that can be placed in the global draw order.
pub trait DrawOrdered {
    /// Returns the key this item is ordered by.
    fn sort_key(&self) -> SortKey;
}

impl DrawOrdered for SortKey {
    #[inline]
    fn sort_key(&self) -> SortKey {
        *self
    }
}

impl<T: DrawOrdered + ?Sized> DrawOrdered for &T {
    #[inline]
    fn sort_key(&self) -> SortKey {
        (**self).sort_key()
    }
}

/// Compares two drawables under the draw-order relation.
///
/// Distances use IEEE total ordering so NaN never breaks a sort or merge.
#[inline]
#[must_use]
pub fn compare_draw_order<A, B>(a: &A, b: &B) -> Ordering
where
    A: DrawOrdered + ?Sized,
    B: DrawOrdered + ?Sized,
{
    let a = a.sort_key();
    let b = b.sort_key();
    a.layer_and_order
        .cmp(&b.layer_and_order)
        .then_with(|| a.distance.total_cmp(&b.distance))
}

/// Returns true if `a` must be drawn strictly before `b`.
#[inline]
#[must_use]
pub fn precedes<A, B>(a: &A, b: &B) -> bool
where
    A: DrawOrdered + ?Sized,
    B: DrawOrdered + ?Sized,
{
    compare_draw_order(a, b) == Ordering::Less
}

/// Finds the first index in `sorted` whose element does not precede `probe`.
///
/// Equal keys resolve after the existing entries' start, i.e. the probe is
/// placed before the first equal element. **O(log n)**.
#[inline]
#[must_use]
pub fn lower_bound<T, P>(sorted: &[T], probe: &P) -> usize
where
    T: DrawOrdered,
    P: DrawOrdered + ?Sized,
{
    sorted.partition_point(|item| precedes(item, probe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layer_dominates_distance() {
        let near_high_layer = SortKey::new(2, -100.0);
        let far_low_layer = SortKey::new(1, 100.0);
        assert!(precedes(&far_low_layer, &near_high_layer));
    }

    #[test]
    fn test_distance_breaks_ties() {
        assert!(precedes(&SortKey::new(0, 1.0), &SortKey::new(0, 2.0)));
        assert!(!precedes(&SortKey::new(0, 2.0), &SortKey::new(0, 2.0)));
    }

    #[test]
    fn test_lower_bound_between() {
        let sequence: Vec<SortKey> = (0..20).map(|i| SortKey::new(0, i as f32)).collect();
        assert_eq!(lower_bound(&sequence, &SortKey::new(0, 10.5)), 11);
    }

    #[test]
    fn test_lower_bound_ties_and_edges() {
        let sequence = [
            SortKey::new(0, 1.0),
            SortKey::new(0, 2.0),
            SortKey::new(0, 2.0),
            SortKey::new(1, 0.0),
        ];
        assert_eq!(lower_bound(&sequence, &SortKey::new(0, 2.0)), 1);
        assert_eq!(lower_bound(&sequence, &SortKey::new(-1, 50.0)), 0);
        assert_eq!(lower_bound(&sequence, &SortKey::new(5, 0.0)), 4);
        assert_eq!(lower_bound::<SortKey, _>(&[], &SortKey::new(0, 0.0)), 0);
    }

    #[test]
    fn test_nan_is_ordered() {
        let nan = SortKey::new(0, f32::NAN);
        let one = SortKey::new(0, 1.0);
        assert_ne!(compare_draw_order(&nan, &one), Ordering::Equal);
    }

    proptest! {
        #[test]
        fn lower_bound_partitions_sequence(
            mut keys in prop::collection::vec((-3i32..3, -100.0f32..100.0), 0..200),
            probe_layer in -3i32..3,
            probe_distance in -100.0f32..100.0,
        ) {
            keys.sort_by(|a, b| compare_draw_order(&SortKey::new(a.0, a.1), &SortKey::new(b.0, b.1)));
            let sequence: Vec<SortKey> = keys.iter().map(|&(l, d)| SortKey::new(l, d)).collect();
            let probe = SortKey::new(probe_layer, probe_distance);

            let index = lower_bound(&sequence, &probe);
            prop_assert!(sequence[..index].iter().all(|s| precedes(s, &probe)));
            prop_assert!(sequence[index..].iter().all(|s| !precedes(s, &probe)));
        }
    }
}
