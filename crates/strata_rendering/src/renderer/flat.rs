//! Single-window renderer without dynamic splicing.

use tracing::{trace, warn};

use super::{RendererStats, SequenceRenderer};
use crate::batching::{pack_instances, UploadTarget, TRANSFORM_FLOAT4S};
use crate::config::FlatConfig;
use crate::error::{StrataError, StrataResult};
use crate::injection::DynamicObjectInjector;
use crate::instance::{InstanceRecord, BYTES_PER_INSTANCE, PACKED_TRANSFORM_SIZE};
use crate::queue::{DrawCommand, MaterialHandle, MeshHandle, RenderQueue};

/// Draws the whole sequence with one instanced command.
///
/// The target holds `max_instances` packed transforms followed by
/// `max_instances` colors. Anything past `max_instances` is not drawn.
#[derive(Debug)]
pub struct FlatRenderer<U> {
    name: String,
    max_instances: usize,
    pack_chunk_size: usize,
    staging: Vec<[f32; 4]>,
    queue: RenderQueue,
    target: U,
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
}

impl<U: UploadTarget> FlatRenderer<U> {
    /// Creates the renderer over `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if `target` is smaller than
    /// `max_instances * 64` bytes.
    pub fn new(
        name: impl Into<String>,
        config: &FlatConfig,
        pack_chunk_size: usize,
        target: U,
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
    ) -> StrataResult<Self> {
        let max = config.max_instances;
        let required = (max * BYTES_PER_INSTANCE) as u64;
        if target.capacity_bytes() < required {
            return Err(StrataError::InvalidConfig(format!(
                "upload target holds {} bytes, flat window needs {required}",
                target.capacity_bytes()
            )));
        }

        Ok(Self {
            name: name.into(),
            max_instances: max,
            pack_chunk_size,
            staging: vec![[0.0; 4]; max * (TRANSFORM_FLOAT4S + 1)],
            queue: RenderQueue::new(1),
            target,
            mesh,
            material,
        })
    }

    /// Maximum instances drawn.
    #[must_use]
    pub const fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// The upload target.
    #[must_use]
    pub const fn target(&self) -> &U {
        &self.target
    }
}

impl<U: UploadTarget> SequenceRenderer for FlatRenderer<U> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_render_data(
        &mut self,
        sequence: &[InstanceRecord],
        _injector: &mut DynamicObjectInjector,
        _frame: u64,
    ) -> StrataResult<RendererStats> {
        let visible = sequence.len().min(self.max_instances);
        if visible < sequence.len() {
            warn!(
                name = %self.name,
                dropped = sequence.len() - visible,
                "flat window full"
            );
        }
        if visible == 0 {
            self.queue.clear();
            return Ok(RendererStats::default());
        }

        let split = self.max_instances * TRANSFORM_FLOAT4S;
        let (transforms, colors) = self.staging.split_at_mut(split);
        pack_instances(&sequence[..visible], transforms, colors, self.pack_chunk_size);

        let transform_bytes: &[u8] = bytemuck::cast_slice(&self.staging[..visible * TRANSFORM_FLOAT4S]);
        let color_bytes: &[u8] = bytemuck::cast_slice(&self.staging[split..split + visible]);
        let color_offset = (PACKED_TRANSFORM_SIZE * self.max_instances) as u64;
        self.target.write(0, transform_bytes)?;
        self.target.write(color_offset, color_bytes)?;
        let uploaded_bytes = (transform_bytes.len() + color_bytes.len()) as u64;

        match (self.mesh, self.material) {
            (Some(mesh), Some(material)) => self.queue.set_single(DrawCommand {
                batch: 0,
                transform_offset: 0,
                color_offset,
                instance_count: u32::try_from(visible).unwrap_or(u32::MAX),
                first_index: 0,
                mesh,
                material,
                sorting_position: None,
            }),
            _ => self.queue.clear(),
        }

        let stats = RendererStats {
            ranges: 1,
            batches: 1,
            draw_commands: self.queue.commands().len(),
            uploaded_bytes,
            ..RendererStats::default()
        };
        trace!(name = %self.name, ?stats, "flat renderer updated");
        Ok(stats)
    }

    fn draw_commands(&self) -> &[DrawCommand] {
        self.queue.commands()
    }
}
