//! Per-frame orchestration.
//!
//! Runs visibility, sorting, dynamic injection and every registered renderer
//! in order for one viewer pose. All components are owned by the pipeline
//! and handed in at construction; there is no global instance.

mod stats;

pub use stats::FrameStats;

use strata_core::SortCamera;
use tracing::trace;

use crate::area::AreaRegistry;
use crate::config::{SortingConfig, StrataConfig};
use crate::error::StrataResult;
use crate::injection::{DynamicObjectInjector, DynamicRenderable};
use crate::instance::InstanceRecord;
use crate::renderer::{RenderManager, RendererStats};
use crate::sorting::AreaSorter;
use crate::visibility::{AreaRaycaster, VisibilityDetector, ViewerPose};

/// The frame loop for one area registry.
#[derive(Debug)]
pub struct FramePipeline {
    visibility: VisibilityDetector,
    sorter: AreaSorter,
    injector: DynamicObjectInjector,
    renderers: RenderManager,
    sorting: SortingConfig,
    frame: u64,
    needs_sort: bool,
    last_render: RendererStats,
}

impl FramePipeline {
    /// Builds every component from configuration, with no renderers.
    #[must_use]
    pub fn new(config: &StrataConfig) -> Self {
        Self::with_components(
            VisibilityDetector::new(&config.visibility),
            AreaSorter::new(&config.sorting),
            DynamicObjectInjector::new(),
            RenderManager::new(),
            config.sorting.clone(),
        )
    }

    /// Assembles a pipeline from existing components.
    #[must_use]
    pub fn with_components(
        visibility: VisibilityDetector,
        sorter: AreaSorter,
        injector: DynamicObjectInjector,
        renderers: RenderManager,
        sorting: SortingConfig,
    ) -> Self {
        Self {
            visibility,
            sorter,
            injector,
            renderers,
            sorting,
            frame: 0,
            needs_sort: true,
            last_render: RendererStats::default(),
        }
    }

    /// Initializes the registered renderers.
    pub fn initialize(&mut self) {
        self.renderers.initialize();
    }

    /// Runs one frame.
    ///
    /// The sequence is rebuilt only when visibility or topology changed.
    /// Renderers rerun when the sequence was rebuilt or a dynamic object
    /// moved; otherwise last frame's draw commands stay in effect.
    ///
    /// # Errors
    ///
    /// Returns the first renderer error. The frame counter still advances.
    pub fn update_frame<D, R>(
        &mut self,
        pose: &ViewerPose,
        registry: &mut AreaRegistry,
        dynamic: &[D],
        raycaster: &R,
    ) -> StrataResult<FrameStats>
    where
        D: DynamicRenderable,
        R: AreaRaycaster + ?Sized,
    {
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        stats.topology_changed = registry.take_topology_changed();
        if stats.topology_changed {
            self.visibility.notify_areas_changed();
        }
        stats.visibility_changed = self.visibility.update_active_areas(pose, registry, raycaster);

        let camera = self.sort_camera(pose);
        stats.injector_dirty = self.injector.update(dynamic, &camera);

        stats.resorted = self.needs_sort || stats.visibility_changed || stats.topology_changed;
        if stats.resorted {
            self.sorter.sort_visible_areas(registry.cells());
            self.needs_sort = false;
        }
        stats.record_sort(self.sorter.stats());

        let render = if stats.resorted || stats.injector_dirty {
            let sequence = self.sorter.sequence();
            self.last_render = self
                .renderers
                .update_render_data(sequence, &mut self.injector, self.frame)?;
            self.last_render
        } else {
            self.last_render.retained()
        };
        stats.record_render(render);

        trace!(
            frame = stats.frame,
            resorted = stats.resorted,
            sequence = stats.sequence_len,
            draws = stats.draw_commands,
            dropped = stats.dropped_ranges,
            "frame updated"
        );
        Ok(stats)
    }

    /// Forces a full rebuild on the next frame.
    pub fn invalidate(&mut self) {
        self.needs_sort = true;
        self.injector.mark_dirty();
    }

    /// Sort camera for `pose` under the configured mode.
    #[must_use]
    pub fn sort_camera(&self, pose: &ViewerPose) -> SortCamera {
        self.sorting.sort_camera(pose.position, pose.forward)
    }

    /// Ordered sequence from the last sort.
    #[must_use]
    pub fn sequence(&self) -> &[InstanceRecord] {
        self.sorter.sequence()
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// The visibility detector.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityDetector {
        &self.visibility
    }

    /// The dynamic-object injector.
    #[must_use]
    pub const fn injector(&self) -> &DynamicObjectInjector {
        &self.injector
    }

    /// The registered renderers.
    #[must_use]
    pub const fn render_manager(&self) -> &RenderManager {
        &self.renderers
    }

    /// Mutable access for registering renderers.
    pub fn render_manager_mut(&mut self) -> &mut RenderManager {
        &mut self.renderers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{Aabb, AreaCell, CellCoord};
    use crate::batching::HostUploadBuffer;
    use crate::config::BatchingConfig;
    use crate::injection::{DynamicObjectDesc, ObjectId};
    use crate::queue::{MaterialHandle, MeshHandle};
    use crate::renderer::BatchedRenderer;
    use crate::visibility::BoundsRaycaster;

    fn registry() -> AreaRegistry {
        let mut registry = AreaRegistry::new();
        for z in -1..=1 {
            for x in -1..=1 {
                let coord = CellCoord::new(x, z);
                let bounds = Aabb::for_cell(coord, 16.0, 0.0, 4.0);
                let center = bounds.center();
                let instances = vec![InstanceRecord::at(center, [1.0; 4], 0, center[2])];
                registry.register(AreaCell::new(coord, bounds, instances));
            }
        }
        registry
    }

    fn pose() -> ViewerPose {
        // Above the origin cell looking down.
        ViewerPose::new([8.0, 10.0, 8.0], [0.0, -1.0, 0.0])
    }

    #[test]
    fn test_first_frame_sorts() {
        let mut pipeline = FramePipeline::new(&StrataConfig::default());
        pipeline.initialize();
        let mut registry = registry();

        let stats = pipeline
            .update_frame(&pose(), &mut registry, &[] as &[DynamicObjectDesc], &BoundsRaycaster)
            .unwrap();

        assert_eq!(stats.frame, 1);
        assert!(stats.topology_changed);
        assert!(stats.visibility_changed);
        assert!(stats.resorted);
        assert_eq!(stats.rows, 3);
        assert!(stats.merged);
        assert_eq!(pipeline.sequence().len(), 9);
    }

    #[test]
    fn test_steady_frame_keeps_sequence() {
        let mut pipeline = FramePipeline::new(&StrataConfig::default());
        let mut registry = registry();
        let none: &[DynamicObjectDesc] = &[];
        pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();

        let stats = pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        assert!(!stats.resorted);
        assert!(!stats.visibility_changed);
        assert_eq!(stats.sequence_len, 9);
    }

    #[test]
    fn test_registration_triggers_resort() {
        let mut pipeline = FramePipeline::new(&StrataConfig::default());
        let mut registry = registry();
        let none: &[DynamicObjectDesc] = &[];
        pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();

        registry.unregister(CellCoord::new(1, 1));
        let stats = pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        assert!(stats.topology_changed);
        assert!(stats.resorted);
        assert_eq!(stats.sequence_len, 8);
    }

    #[test]
    fn test_dynamic_change_reported_without_resort() {
        let mut pipeline = FramePipeline::new(&StrataConfig::default());
        let mut registry = registry();
        let object = |z: f32| DynamicObjectDesc {
            id: ObjectId(1),
            position: [0.0, 0.0, z],
            layer_and_order: 0,
        };
        pipeline.update_frame(&pose(), &mut registry, &[object(0.0)], &BoundsRaycaster).unwrap();

        let stats = pipeline.update_frame(&pose(), &mut registry, &[object(5.0)], &BoundsRaycaster).unwrap();
        assert!(stats.injector_dirty);
        assert!(!stats.resorted);

        let stats = pipeline.update_frame(&pose(), &mut registry, &[object(5.0)], &BoundsRaycaster).unwrap();
        assert!(!stats.injector_dirty);
    }

    #[test]
    fn test_invalidate_forces_resort() {
        let mut pipeline = FramePipeline::new(&StrataConfig::default());
        let mut registry = registry();
        let none: &[DynamicObjectDesc] = &[];
        pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        pipeline.invalidate();
        let stats = pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        assert!(stats.resorted);
        assert!(stats.injector_dirty);
    }

    #[test]
    fn test_idle_frame_uploads_nothing() {
        let config = StrataConfig {
            batching: BatchingConfig {
                batch_capacity: 4,
                initial_pool_size: 1,
                max_pool_size: 2,
                pack_chunk_size: 4,
            },
            ..StrataConfig::default()
        };
        let buffer = HostUploadBuffer::new(2 * 4 * 64);
        let renderer = BatchedRenderer::new(
            "props",
            &config.batching,
            buffer,
            Some(MeshHandle(1)),
            Some(MaterialHandle(1)),
        )
        .unwrap();
        let mut pipeline = FramePipeline::new(&config);
        assert!(pipeline.render_manager_mut().register(Box::new(renderer)).is_ok());
        pipeline.initialize();
        let mut registry = registry();
        let none: &[DynamicObjectDesc] = &[];

        // Nine instances over two batches of four: one range is dropped.
        let first = pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        assert!(first.uploaded_bytes > 0);
        assert_eq!(first.dropped_ranges, 1);

        let idle = pipeline.update_frame(&pose(), &mut registry, none, &BoundsRaycaster).unwrap();
        assert!(!idle.resorted);
        assert!(!idle.injector_dirty);
        assert_eq!(idle.uploaded_bytes, 0);
        assert_eq!(idle.dropped_ranges, 0);
        assert_eq!(idle.draw_commands, first.draw_commands);
    }
}
