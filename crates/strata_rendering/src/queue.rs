//! # Render Queue
//!
//! Turns assigned batches into draw commands for the host renderer.

use strata_core::FrameArena;

use crate::batching::Batch;

/// Host-registered mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Host-registered material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u32);

/// One instanced draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Pool slot of the source batch.
    pub batch: usize,
    /// Byte offset of the packed transforms in the persistent buffer.
    pub transform_offset: u64,
    /// Byte offset of the colors in the persistent buffer.
    pub color_offset: u64,
    /// Instances to draw.
    pub instance_count: u32,
    /// Sequence index of the first instance.
    pub first_index: usize,
    /// Mesh to draw.
    pub mesh: MeshHandle,
    /// Material to draw with.
    pub material: MaterialHandle,
    /// Position the host uses to depth-sort this draw, if any.
    pub sorting_position: Option<[f32; 3]>,
}

/// Ordered draw commands, rebuilt every frame into reused storage.
#[derive(Debug)]
pub struct RenderQueue {
    commands: FrameArena<DrawCommand>,
}

impl RenderQueue {
    /// Creates a queue with room for `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: FrameArena::new(capacity),
        }
    }

    /// Rebuilds the queue: one command per non-empty batch, in batch order.
    ///
    /// Without both a mesh and a material nothing can be drawn and the queue
    /// is left empty.
    pub fn build_render_queue<'a, I>(
        &mut self,
        batches: I,
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
    ) -> &[DrawCommand]
    where
        I: IntoIterator<Item = &'a Batch>,
    {
        self.commands.reset();
        let (Some(mesh), Some(material)) = (mesh, material) else {
            return self.commands.as_slice();
        };

        self.commands.extend(
            batches
                .into_iter()
                .filter(|batch| batch.count() > 0)
                .map(|batch| DrawCommand {
                    batch: batch.index(),
                    transform_offset: batch.transform_offset(),
                    color_offset: batch.color_offset(),
                    instance_count: u32::try_from(batch.count()).unwrap_or(u32::MAX),
                    first_index: batch.start_index(),
                    mesh,
                    material,
                    sorting_position: Some(batch.sorting_position()),
                }),
        );
        self.commands.as_slice()
    }

    /// Replaces the queue with a single command.
    pub fn set_single(&mut self, command: DrawCommand) {
        self.commands.reset();
        self.commands.push(command);
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.commands.reset();
    }

    /// Commands from the last build.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        self.commands.as_slice()
    }

    /// Total instances across all commands.
    #[must_use]
    pub fn total_instances(&self) -> u64 {
        self.commands.as_slice().iter().map(|c| u64::from(c.instance_count)).sum()
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceRecord;

    fn batches() -> Vec<Batch> {
        let mut a = Batch::new(0, 4);
        a.stage(&[InstanceRecord::default(); 3], 0, 0, 1);
        let empty = Batch::new(1, 4);
        let mut b = Batch::new(2, 4);
        b.stage(&[InstanceRecord::at([5.0, 0.0, 0.0], [1.0; 4], 0, 0.0)], 3, 0, 1);
        vec![a, empty, b]
    }

    #[test]
    fn test_one_command_per_batch_in_order() {
        let batches = batches();
        let mut queue = RenderQueue::default();
        let commands = queue.build_render_queue(&batches, Some(MeshHandle(1)), Some(MaterialHandle(2)));

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].batch, 0);
        assert_eq!(commands[0].instance_count, 3);
        assert_eq!(commands[1].batch, 2);
        assert_eq!(commands[1].first_index, 3);
        assert_eq!(commands[1].transform_offset, batches[2].transform_offset());
        assert_eq!(commands[1].sorting_position, Some([5.0, 0.0, 0.0]));
        assert_eq!(queue.total_instances(), 4);
    }

    #[test]
    fn test_missing_assets_yield_nothing() {
        let batches = batches();
        let mut queue = RenderQueue::default();
        assert!(queue.build_render_queue(&batches, None, Some(MaterialHandle(2))).is_empty());
        assert!(queue.build_render_queue(&batches, Some(MeshHandle(1)), None).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_previous() {
        let batches = batches();
        let mut queue = RenderQueue::default();
        queue.build_render_queue(&batches, Some(MeshHandle(1)), Some(MaterialHandle(2)));
        queue.build_render_queue(&batches[..1], Some(MeshHandle(1)), Some(MaterialHandle(2)));
        assert_eq!(queue.commands().len(), 1);
    }
}
