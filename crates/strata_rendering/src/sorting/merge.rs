//! Parallel row sorting and the N-way merge.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use strata_core::{compare_draw_order, DrawOrdered, SortKey};

/// Sorts every row by draw order, one rayon task per row.
///
/// Rows share no state; the call returns once every row is sorted. The sort
/// is stable, so equal keys keep their concatenation order.
pub fn sort_rows_parallel<T>(rows: &mut [Vec<T>])
where
    T: DrawOrdered + Send,
{
    rows.par_iter_mut().for_each(|row| row.sort_by(compare_draw_order));
}

/// The current head of one row inside the merge heap.
#[derive(Debug, Clone, Copy)]
struct Head {
    key: SortKey,
    row: usize,
    pos: usize,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap. Ties go to the lower row.
        compare_draw_order(&other.key, &self.key).then_with(|| other.row.cmp(&self.row))
    }
}

/// Merges sorted rows into `out` (appended) under the draw-order relation.
///
/// Equal keys are emitted lower row first, so the merge is stable with
/// respect to row order. **O(n log k)** for k rows.
pub fn kway_merge<T>(rows: &[Vec<T>], out: &mut Vec<T>)
where
    T: DrawOrdered + Copy,
{
    let total: usize = rows.iter().map(Vec::len).sum();
    out.reserve(total);

    let mut heap: BinaryHeap<Head> = rows
        .iter()
        .enumerate()
        .filter_map(|(row, items)| {
            items.first().map(|first| Head {
                key: first.sort_key(),
                row,
                pos: 0,
            })
        })
        .collect();

    while let Some(head) = heap.pop() {
        let items = &rows[head.row];
        out.push(items[head.pos]);

        let next = head.pos + 1;
        if let Some(item) = items.get(next) {
            heap.push(Head {
                key: item.sort_key(),
                row: head.row,
                pos: next,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_core::precedes;

    fn keys(pairs: &[(i32, f32)]) -> Vec<SortKey> {
        pairs.iter().map(|&(l, d)| SortKey::new(l, d)).collect()
    }

    #[test]
    fn test_three_rows_merge() {
        let rows = vec![
            keys(&[(0, 1.0), (1, 0.0)]),
            keys(&[(0, 0.5), (0, 2.0)]),
            keys(&[(2, 0.0)]),
        ];
        let mut out = Vec::new();
        kway_merge(&rows, &mut out);
        assert_eq!(out, keys(&[(0, 0.5), (0, 1.0), (0, 2.0), (1, 0.0), (2, 0.0)]));
    }

    #[test]
    fn test_ties_prefer_lower_row() {
        #[derive(Clone, Copy)]
        struct Tagged(SortKey, char);
        impl DrawOrdered for Tagged {
            fn sort_key(&self) -> SortKey {
                self.0
            }
        }

        let key = SortKey::new(0, 1.0);
        let rows = vec![vec![Tagged(key, 'a')], vec![Tagged(key, 'b')], vec![Tagged(key, 'c')]];
        let mut out = Vec::new();
        kway_merge(&rows, &mut out);
        let tags: String = out.iter().map(|t| t.1).collect();
        assert_eq!(tags, "abc");
    }

    #[test]
    fn test_empty_rows() {
        let rows: Vec<Vec<SortKey>> = vec![Vec::new(), keys(&[(0, 0.0)]), Vec::new()];
        let mut out = Vec::new();
        kway_merge(&rows, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_parallel_row_sort() {
        let mut rows = vec![
            keys(&[(3, 0.0), (1, 0.0), (2, 0.0)]),
            keys(&[(0, 9.0), (0, -9.0)]),
        ];
        sort_rows_parallel(&mut rows);
        assert_eq!(rows[0], keys(&[(1, 0.0), (2, 0.0), (3, 0.0)]));
        assert_eq!(rows[1], keys(&[(0, -9.0), (0, 9.0)]));
    }

    fn sorted_row() -> impl Strategy<Value = Vec<SortKey>> {
        prop::collection::vec((-4i32..4, -100.0f32..100.0), 0..60).prop_map(|pairs| {
            let mut row = keys(&pairs);
            row.sort_by(compare_draw_order);
            row
        })
    }

    proptest! {
        #[test]
        fn merge_is_sorted_and_complete(rows in prop::collection::vec(sorted_row(), 1..8)) {
            let mut out = Vec::new();
            kway_merge(&rows, &mut out);

            let total: usize = rows.iter().map(Vec::len).sum();
            prop_assert_eq!(out.len(), total);
            for pair in out.windows(2) {
                prop_assert!(!precedes(&pair[1], &pair[0]));
            }
        }
    }
}
