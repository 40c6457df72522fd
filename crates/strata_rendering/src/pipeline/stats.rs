//! Frame statistics.

use crate::renderer::RendererStats;
use crate::sorting::SortStats;

/// Statistics from one pipeline update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Whether any cell's activation changed.
    pub visibility_changed: bool,
    /// Whether the dynamic objects changed.
    pub injector_dirty: bool,
    /// Whether cells were registered or removed since the last frame.
    pub topology_changed: bool,
    /// Whether the sequence was rebuilt this frame.
    pub resorted: bool,
    /// Active rows in the last sort.
    pub rows: usize,
    /// Whether the last sort merged (false = concatenation fallback).
    pub merged: bool,
    /// Whether the last sort produced a fully draw-ordered sequence.
    pub ordered: bool,
    /// Length of the ordered sequence.
    pub sequence_len: usize,
    /// Dynamic insertion points.
    pub insertion_points: usize,
    /// Render ranges across all renderers.
    pub ranges: usize,
    /// Batches assigned.
    pub batches: usize,
    /// Ranges dropped because the pool was exhausted.
    pub dropped_ranges: usize,
    /// Draw commands emitted.
    pub draw_commands: usize,
    /// Bytes uploaded this frame.
    pub uploaded_bytes: u64,
}

impl FrameStats {
    pub(crate) fn record_sort(&mut self, sort: SortStats) {
        self.rows = sort.rows;
        self.merged = sort.merged;
        self.ordered = sort.ordered;
        self.sequence_len = sort.len;
    }

    pub(crate) fn record_render(&mut self, render: RendererStats) {
        self.insertion_points = render.insertion_points;
        self.ranges = render.ranges;
        self.batches = render.batches;
        self.dropped_ranges = render.dropped_ranges;
        self.draw_commands = render.draw_commands;
        self.uploaded_bytes = render.uploaded_bytes;
    }

    /// Returns true if every range found a batch.
    #[must_use]
    pub const fn pool_ok(&self) -> bool {
        self.dropped_ranges == 0
    }

    /// Returns true if the last sort guaranteed a fully ordered sequence.
    #[must_use]
    pub const fn fully_ordered(&self) -> bool {
        self.ordered
    }
}
