//! # Sequence Renderers
//!
//! Consumers of the ordered instance sequence. Each renderer owns its GPU
//! resources and exposes the draw commands the host reads back during its
//! culling callback.

mod batched;
mod flat;

pub use batched::BatchedRenderer;
pub use flat::FlatRenderer;

use tracing::{debug, info};

use crate::error::StrataResult;
use crate::injection::DynamicObjectInjector;
use crate::instance::InstanceRecord;
use crate::queue::DrawCommand;

/// Per-renderer results of one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Insertion points computed.
    pub insertion_points: usize,
    /// Render ranges produced.
    pub ranges: usize,
    /// Batches assigned.
    pub batches: usize,
    /// Ranges dropped on pool exhaustion.
    pub dropped_ranges: usize,
    /// Draw commands emitted.
    pub draw_commands: usize,
    /// Bytes uploaded.
    pub uploaded_bytes: u64,
}

impl RendererStats {
    /// Stats for a frame that reuses this update's draw commands.
    ///
    /// The commands and ranges still stand; nothing was uploaded and
    /// nothing new was dropped.
    #[must_use]
    pub const fn retained(self) -> Self {
        Self {
            uploaded_bytes: 0,
            dropped_ranges: 0,
            ..self
        }
    }
}

impl std::ops::AddAssign for RendererStats {
    fn add_assign(&mut self, other: Self) {
        self.insertion_points += other.insertion_points;
        self.ranges += other.ranges;
        self.batches += other.batches;
        self.dropped_ranges += other.dropped_ranges;
        self.draw_commands += other.draw_commands;
        self.uploaded_bytes += other.uploaded_bytes;
    }
}

/// Something that draws the ordered instance sequence.
pub trait SequenceRenderer {
    /// Name used for registration and logging.
    fn name(&self) -> &str;

    /// One-time setup. Called before the first update.
    fn initialize(&mut self) {}

    /// Rebuilds GPU data and draw commands from a new sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if an upload violates the target's bounds.
    fn update_render_data(
        &mut self,
        sequence: &[InstanceRecord],
        injector: &mut DynamicObjectInjector,
        frame: u64,
    ) -> StrataResult<RendererStats>;

    /// Draw commands from the last update, in draw order.
    fn draw_commands(&self) -> &[DrawCommand];
}

/// Fans sequence updates out to every registered renderer.
#[derive(Default)]
pub struct RenderManager {
    renderers: Vec<Box<dyn SequenceRenderer>>,
    initialized: bool,
}

impl std::fmt::Debug for RenderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderManager")
            .field("renderers", &self.renderers.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl RenderManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes every registered renderer. Idempotent.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        for renderer in &mut self.renderers {
            renderer.initialize();
        }
        self.initialized = true;
        info!(renderers = self.renderers.len(), "render manager initialized");
    }

    /// Registers a renderer. Names must be unique; a duplicate is rejected
    /// and handed back.
    ///
    /// # Errors
    ///
    /// Returns the renderer if one with the same name is already registered.
    pub fn register(
        &mut self,
        mut renderer: Box<dyn SequenceRenderer>,
    ) -> Result<(), Box<dyn SequenceRenderer>> {
        if self.renderers.iter().any(|r| r.name() == renderer.name()) {
            return Err(renderer);
        }
        if self.initialized {
            renderer.initialize();
        }
        debug!(name = renderer.name(), "renderer registered");
        self.renderers.push(renderer);
        Ok(())
    }

    /// Removes a renderer by name.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn SequenceRenderer>> {
        let index = self.renderers.iter().position(|r| r.name() == name)?;
        debug!(name, "renderer unregistered");
        Some(self.renderers.remove(index))
    }

    /// Returns a renderer by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn SequenceRenderer> {
        self.renderers.iter().find(|r| r.name() == name).map(|r| &**r)
    }

    /// Number of registered renderers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// Returns true if no renderer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Whether [`RenderManager::initialize`] has run.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Updates every renderer with the new sequence.
    ///
    /// Does nothing before initialization.
    ///
    /// # Errors
    ///
    /// Returns the first renderer error.
    pub fn update_render_data(
        &mut self,
        sequence: &[InstanceRecord],
        injector: &mut DynamicObjectInjector,
        frame: u64,
    ) -> StrataResult<RendererStats> {
        let mut total = RendererStats::default();
        if !self.initialized {
            return Ok(total);
        }
        for renderer in &mut self.renderers {
            total += renderer.update_render_data(sequence, injector, frame)?;
        }
        Ok(total)
    }

    /// Every renderer's draw commands, in registration order.
    pub fn draw_commands(&self) -> impl Iterator<Item = (&str, &[DrawCommand])> {
        self.renderers.iter().map(|r| (r.name(), r.draw_commands()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports the sequence length as its range count.
    struct CountingRenderer {
        name: &'static str,
        initialized: bool,
    }

    impl CountingRenderer {
        fn boxed(name: &'static str) -> Box<dyn SequenceRenderer> {
            Box::new(Self {
                name,
                initialized: false,
            })
        }
    }

    impl SequenceRenderer for CountingRenderer {
        fn name(&self) -> &str {
            self.name
        }

        fn initialize(&mut self) {
            self.initialized = true;
        }

        fn update_render_data(
            &mut self,
            sequence: &[InstanceRecord],
            _: &mut DynamicObjectInjector,
            _: u64,
        ) -> StrataResult<RendererStats> {
            assert!(self.initialized);
            Ok(RendererStats {
                ranges: sequence.len(),
                ..RendererStats::default()
            })
        }

        fn draw_commands(&self) -> &[DrawCommand] {
            &[]
        }
    }

    #[test]
    fn test_update_requires_initialize() {
        let mut manager = RenderManager::new();
        assert!(manager.register(CountingRenderer::boxed("a")).is_ok());
        let mut injector = DynamicObjectInjector::new();
        let sequence = vec![InstanceRecord::default(); 3];

        let stats = manager.update_render_data(&sequence, &mut injector, 0).unwrap();
        assert_eq!(stats, RendererStats::default());

        manager.initialize();
        assert!(manager.register(CountingRenderer::boxed("b")).is_ok());
        let stats = manager.update_render_data(&sequence, &mut injector, 1).unwrap();
        assert_eq!(stats.ranges, 6);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut manager = RenderManager::new();
        assert!(manager.register(CountingRenderer::boxed("a")).is_ok());
        assert!(manager.register(CountingRenderer::boxed("a")).is_err());
        assert_eq!(manager.len(), 1);

        assert!(manager.unregister("a").is_some());
        assert!(manager.unregister("a").is_none());
        assert!(manager.is_empty());
    }
}
