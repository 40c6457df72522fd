//! A single fixed-capacity batch and its staging memory.

use rayon::prelude::*;

use crate::instance::{InstanceRecord, FLOAT4_SIZE, PACKED_TRANSFORM_SIZE};

/// Float4s per packed transform.
pub(crate) const TRANSFORM_FLOAT4S: usize = PACKED_TRANSFORM_SIZE / FLOAT4_SIZE;

/// Packs `records` as 3x4 transforms into `transforms` and colors into
/// `colors`, in parallel.
///
/// Each instance writes only its own slots. `transforms` must hold three
/// float4s and `colors` one float4 per record.
pub(crate) fn pack_instances(
    records: &[InstanceRecord],
    transforms: &mut [[f32; 4]],
    colors: &mut [[f32; 4]],
    chunk_size: usize,
) {
    let count = records.len();
    transforms[..count * TRANSFORM_FLOAT4S]
        .par_chunks_mut(TRANSFORM_FLOAT4S)
        .zip(colors[..count].par_iter_mut())
        .zip(records.par_iter())
        .with_min_len(chunk_size.max(1))
        .for_each(|((transform, color), record)| {
            transform.copy_from_slice(&record.packed_transform());
            *color = record.color;
        });
}

/// Pool membership of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// On the pool's available stack.
    #[default]
    Available,
    /// Assigned to a range this frame.
    InUse,
}

/// A fixed-capacity unit of GPU-uploadable instance data.
///
/// The staging block mirrors the batch's slice of the persistent buffer:
/// `capacity` packed transforms (three float4s each) followed by `capacity`
/// colors.
#[derive(Debug)]
pub struct Batch {
    index: usize,
    capacity: usize,
    count: usize,
    state: BatchState,
    transform_offset: u64,
    color_offset: u64,
    staging: Vec<[f32; 4]>,
    start_index: usize,
    sorting_position: [f32; 3],
    last_used: u64,
}

impl Batch {
    /// Bytes one batch of `capacity` instances occupies in the shared buffer.
    #[must_use]
    pub const fn bytes_for(capacity: usize) -> usize {
        capacity * (PACKED_TRANSFORM_SIZE + FLOAT4_SIZE)
    }

    /// Creates the batch in pool slot `index`. Its byte offsets are fixed
    /// from the slot.
    #[must_use]
    pub fn new(index: usize, capacity: usize) -> Self {
        let transform_offset = (index * Self::bytes_for(capacity)) as u64;
        Self {
            index,
            capacity,
            count: 0,
            state: BatchState::Available,
            transform_offset,
            color_offset: transform_offset + (PACKED_TRANSFORM_SIZE * capacity) as u64,
            staging: vec![[0.0; 4]; capacity * (TRANSFORM_FLOAT4S + 1)],
            start_index: 0,
            sorting_position: [0.0; 3],
            last_used: 0,
        }
    }

    /// Pool slot.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Maximum instances.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instances staged this frame.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Pool membership.
    #[must_use]
    pub const fn state(&self) -> BatchState {
        self.state
    }

    /// Byte offset of the transform block in the shared buffer.
    #[must_use]
    pub const fn transform_offset(&self) -> u64 {
        self.transform_offset
    }

    /// Byte offset of the color block in the shared buffer.
    #[must_use]
    pub const fn color_offset(&self) -> u64 {
        self.color_offset
    }

    /// First sequence index held by this batch.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// World position used to depth-sort the batch's draw command.
    #[must_use]
    pub const fn sorting_position(&self) -> [f32; 3] {
        self.sorting_position
    }

    /// Frame number of the last assignment.
    #[must_use]
    pub const fn last_used(&self) -> u64 {
        self.last_used
    }

    pub(crate) fn set_state(&mut self, state: BatchState) {
        self.state = state;
        if state == BatchState::Available {
            self.count = 0;
        }
    }

    /// Packs `records` into the staging block.
    ///
    /// Packing runs on rayon with at least `chunk_size` instances per task.
    /// Records beyond capacity are ignored.
    pub fn stage(
        &mut self,
        records: &[InstanceRecord],
        start_index: usize,
        frame: u64,
        chunk_size: usize,
    ) {
        let count = records.len().min(self.capacity);
        let records = &records[..count];

        let (transforms, colors) = self.staging.split_at_mut(self.capacity * TRANSFORM_FLOAT4S);
        pack_instances(records, transforms, colors, chunk_size);

        self.count = count;
        self.start_index = start_index;
        self.sorting_position = records.last().map_or([0.0; 3], |r| r.world_position);
        self.last_used = frame;
    }

    /// Touched part of the transform block.
    #[must_use]
    pub fn transform_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.staging[..self.count * TRANSFORM_FLOAT4S])
    }

    /// Touched part of the color block.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        let base = self.capacity * TRANSFORM_FLOAT4S;
        bytemuck::cast_slice(&self.staging[base..base + self.count])
    }
}
