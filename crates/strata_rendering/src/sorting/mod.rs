//! # Row Sorter
//!
//! Produces one globally ordered instance sequence from the active cells.
//!
//! ## Pipeline
//!
//! ```text
//! active cells ──group by row──► row buffers ──rayon sort──► N-way merge ──► sequence
//! ```
//!
//! Cells within a row are concatenated in column order. Each cell is
//! locally sorted but the concatenation is not, so every row is sorted before
//! the merge. When fewer than `min_merge_rows` rows are active the rows are
//! concatenated unsorted instead; cross-row order is then not guaranteed.

mod merge;

pub use merge::{kway_merge, sort_rows_parallel};

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::area::AreaCell;
use crate::config::SortingConfig;
use crate::instance::InstanceRecord;

/// Outcome of the last sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of active rows.
    pub rows: usize,
    /// Whether rows were sorted and merged (false = concatenation fallback).
    pub merged: bool,
    /// Whether the sequence is fully draw-ordered: merged, or at most one
    /// cell contributed.
    pub ordered: bool,
    /// Length of the output sequence.
    pub len: usize,
}

/// Groups, sorts and merges active cells into one ordered sequence.
///
/// Row buffers and the output are kept between frames to avoid reallocating.
#[derive(Debug)]
pub struct AreaSorter {
    min_merge_rows: usize,
    rows: Vec<Vec<InstanceRecord>>,
    sequence: Vec<InstanceRecord>,
    stats: SortStats,
}

impl AreaSorter {
    /// Creates a sorter from configuration.
    #[must_use]
    pub fn new(config: &SortingConfig) -> Self {
        Self {
            min_merge_rows: config.min_merge_rows.max(1),
            rows: Vec::new(),
            sequence: Vec::new(),
            stats: SortStats::default(),
        }
    }

    /// Rebuilds the ordered sequence from every active cell in `cells`.
    ///
    /// Inactive cells are skipped. Returns the new sequence.
    pub fn sort_visible_areas<'a, I>(&mut self, cells: I) -> &[InstanceRecord]
    where
        I: IntoIterator<Item = &'a AreaCell>,
    {
        let mut grouped: BTreeMap<i32, Vec<&AreaCell>> = BTreeMap::new();
        let mut cell_count = 0;
        for cell in cells.into_iter().filter(|c| c.is_active()) {
            grouped.entry(cell.coord().row()).or_default().push(cell);
            cell_count += 1;
        }

        let row_count = grouped.len();
        self.fill_rows(grouped.values());
        self.sequence.clear();

        let merged = row_count >= self.min_merge_rows;
        if merged {
            let rows = &mut self.rows[..row_count];
            sort_rows_parallel(rows);
            kway_merge(rows, &mut self.sequence);
        } else {
            if row_count > 0 {
                warn!(
                    rows = row_count,
                    min_merge_rows = self.min_merge_rows,
                    "too few active rows, concatenating without merge"
                );
            }
            for row in &self.rows[..row_count] {
                self.sequence.extend_from_slice(row);
            }
        }

        self.stats = SortStats {
            rows: row_count,
            merged,
            ordered: merged || cell_count <= 1,
            len: self.sequence.len(),
        };
        trace!(rows = row_count, merged, len = self.sequence.len(), "areas sorted");
        &self.sequence
    }

    /// Copies each row's cells into its reusable buffer.
    fn fill_rows<'a, 'b, R>(&mut self, rows: R)
    where
        'a: 'b,
        R: ExactSizeIterator<Item = &'b Vec<&'a AreaCell>>,
    {
        let count = rows.len();
        if self.rows.len() < count {
            self.rows.resize_with(count, Vec::new);
        }
        for (buffer, cells) in self.rows.iter_mut().zip(rows) {
            buffer.clear();
            buffer.reserve(cells.iter().map(|c| c.len()).sum());
            for cell in cells {
                buffer.extend_from_slice(cell.instances());
            }
        }
        for buffer in &mut self.rows[count..] {
            buffer.clear();
        }
    }

    /// The sequence produced by the last sort.
    #[must_use]
    pub fn sequence(&self) -> &[InstanceRecord] {
        &self.sequence
    }

    /// Statistics of the last sort.
    #[must_use]
    pub const fn stats(&self) -> SortStats {
        self.stats
    }

    /// Minimum active rows for a full merge.
    #[must_use]
    pub const fn min_merge_rows(&self) -> usize {
        self.min_merge_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{Aabb, CellCoord};

    fn active_cell(x: i32, z: i32, distances: &[f32]) -> AreaCell {
        let records = distances
            .iter()
            .map(|&d| InstanceRecord::at([0.0; 3], [1.0; 4], 0, d))
            .collect();
        let mut cell = AreaCell::new(CellCoord::new(x, z), Aabb::default(), records);
        cell.set_active(true);
        cell
    }

    #[test]
    fn test_no_active_cells() {
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        let mut cell = active_cell(0, 0, &[1.0]);
        cell.set_active(false);
        assert!(sorter.sort_visible_areas([&cell]).is_empty());
        assert_eq!(sorter.stats().rows, 0);
    }

    #[test]
    fn test_three_rows_are_merged() {
        let cells = [
            active_cell(0, 0, &[5.0, 9.0]),
            active_cell(1, 0, &[1.0]),
            active_cell(0, 1, &[2.0, 8.0]),
            active_cell(0, 2, &[0.0, 7.0]),
        ];
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        let distances: Vec<f32> = sorter.sort_visible_areas(&cells).iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 5.0, 7.0, 8.0, 9.0]);
        assert_eq!(
            sorter.stats(),
            SortStats {
                rows: 3,
                merged: true,
                ordered: true,
                len: 7
            }
        );
    }

    #[test]
    fn test_two_rows_concatenate_in_row_order() {
        let cells = [active_cell(0, 1, &[0.0]), active_cell(0, 0, &[3.0, 4.0])];
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        let distances: Vec<f32> = sorter.sort_visible_areas(&cells).iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![3.0, 4.0, 0.0]);
        assert!(!sorter.stats().merged);
        assert!(!sorter.stats().ordered);
    }

    #[test]
    fn test_single_row_of_cells_is_not_ordered() {
        // Both cells are locally sorted but interleave once concatenated.
        let cells = [active_cell(0, 0, &[5.0]), active_cell(1, 0, &[1.0])];
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        let distances: Vec<f32> = sorter.sort_visible_areas(&cells).iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![5.0, 1.0]);
        assert_eq!(sorter.stats().rows, 1);
        assert!(!sorter.stats().merged);
        assert!(!sorter.stats().ordered);
    }

    #[test]
    fn test_single_cell_is_ordered() {
        let cells = [active_cell(0, 0, &[5.0, 1.0])];
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        sorter.sort_visible_areas(&cells);
        assert!(!sorter.stats().merged);
        assert!(sorter.stats().ordered);
    }

    #[test]
    fn test_threshold_of_one_always_merges() {
        let config = SortingConfig {
            min_merge_rows: 1,
            ..SortingConfig::default()
        };
        let cells = [active_cell(0, 1, &[0.0]), active_cell(0, 0, &[3.0, 4.0])];
        let mut sorter = AreaSorter::new(&config);
        let distances: Vec<f32> = sorter.sort_visible_areas(&cells).iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_buffers_are_reused() {
        let cells = [
            active_cell(0, 0, &[1.0]),
            active_cell(0, 1, &[2.0]),
            active_cell(0, 2, &[3.0]),
        ];
        let mut sorter = AreaSorter::new(&SortingConfig::default());
        sorter.sort_visible_areas(&cells);
        sorter.sort_visible_areas(&cells[..1]);
        assert_eq!(sorter.sequence().len(), 1);
        assert_eq!(sorter.stats().rows, 1);
    }
}
