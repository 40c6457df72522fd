//! Dynamic-aware renderer drawing the sequence through pooled batches.

use strata_core::FrameArena;
use tracing::trace;

use super::{RendererStats, SequenceRenderer};
use crate::batching::{BatchAssigner, BatchPool, UploadTarget};
use crate::config::BatchingConfig;
use crate::error::{StrataError, StrataResult};
use crate::injection::{DynamicObjectInjector, InsertionPoint};
use crate::instance::InstanceRecord;
use crate::queue::{DrawCommand, MaterialHandle, MeshHandle, RenderQueue};
use crate::ranges::{split_render_ranges, RenderRange};

/// Splits the sequence at dynamic insertion points and draws each static
/// run from its own batch, so the host can interleave dynamic objects
/// between the draws.
#[derive(Debug)]
pub struct BatchedRenderer<U> {
    name: String,
    pool: BatchPool,
    assigner: BatchAssigner,
    queue: RenderQueue,
    ranges: FrameArena<RenderRange>,
    ordered_points: Vec<InsertionPoint>,
    target: U,
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
}

impl<U: UploadTarget> BatchedRenderer<U> {
    /// Creates the renderer and its pool.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if `target` cannot hold the
    /// pool at its ceiling.
    pub fn new(
        name: impl Into<String>,
        config: &BatchingConfig,
        target: U,
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
    ) -> StrataResult<Self> {
        let pool = BatchPool::new(config);
        let required = pool.buffer_size_bytes();
        if target.capacity_bytes() < required {
            return Err(StrataError::InvalidConfig(format!(
                "upload target holds {} bytes, batch pool needs {required}",
                target.capacity_bytes()
            )));
        }

        Ok(Self {
            name: name.into(),
            pool,
            assigner: BatchAssigner::new(config.pack_chunk_size),
            queue: RenderQueue::new(config.max_pool_size),
            ranges: FrameArena::new(64),
            ordered_points: Vec::new(),
            target,
            mesh,
            material,
        })
    }

    /// The batch pool.
    #[must_use]
    pub const fn pool(&self) -> &BatchPool {
        &self.pool
    }

    /// The upload target.
    #[must_use]
    pub const fn target(&self) -> &U {
        &self.target
    }
}

impl<U: UploadTarget> SequenceRenderer for BatchedRenderer<U> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_render_data(
        &mut self,
        sequence: &[InstanceRecord],
        injector: &mut DynamicObjectInjector,
        frame: u64,
    ) -> StrataResult<RendererStats> {
        let points = injector.calculate_insertion_points(sequence);
        let insertion_points = points.len();

        let mut ranges = self.ranges.begin_frame();
        split_render_ranges(sequence, points, &mut self.ordered_points, &mut *ranges);

        let assigned = self.assigner.assign(
            &mut self.pool,
            ranges.as_slice(),
            sequence,
            &mut self.target,
            frame,
        )?;

        let pool = &self.pool;
        let batches = self.assigner.assigned().iter().filter_map(|&h| pool.get(h));
        let draw_commands = self
            .queue
            .build_render_queue(batches, self.mesh, self.material)
            .len();

        let stats = RendererStats {
            insertion_points,
            ranges: ranges.len(),
            batches: assigned.batches,
            dropped_ranges: assigned.dropped_ranges,
            draw_commands,
            uploaded_bytes: assigned.uploaded_bytes,
        };
        trace!(name = %self.name, ?stats, "batched renderer updated");
        Ok(stats)
    }

    fn draw_commands(&self) -> &[DrawCommand] {
        self.queue.commands()
    }
}
