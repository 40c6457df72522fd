//! # Visibility Detection
//!
//! Picks the active set of area cells from the viewer pose.
//!
//! Work is only done when the viewer crosses a cell boundary or the cell
//! topology changes. On a trigger the looked-at cell is found by ray cast
//! and its square neighborhood becomes the active set.

mod raycast;

pub use raycast::{AreaRaycaster, BoundsRaycaster};

use std::collections::BTreeSet;

use tracing::debug;

use crate::area::{AreaRegistry, CellCoord};
use crate::config::{VisibilityConfig, MAX_NEIGHBORHOOD_RADIUS};

/// Viewer position and look direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerPose {
    /// World-space position.
    pub position: [f32; 3],
    /// View direction.
    pub forward: [f32; 3],
}

impl ViewerPose {
    /// Creates a new pose.
    #[must_use]
    pub const fn new(position: [f32; 3], forward: [f32; 3]) -> Self {
        Self { position, forward }
    }
}

/// Tracks the viewer's grid cell and maintains the active cell set.
#[derive(Debug)]
pub struct VisibilityDetector {
    cell_size: f32,
    visible_distance: f32,
    radius: i32,
    last_viewer_cell: Option<CellCoord>,
    areas_changed: bool,
    center: Option<CellCoord>,
    active: BTreeSet<CellCoord>,
}

impl VisibilityDetector {
    /// Creates a detector from configuration.
    #[must_use]
    pub fn new(config: &VisibilityConfig) -> Self {
        Self {
            cell_size: config.cell_size,
            visible_distance: config.visible_distance,
            radius: i32::try_from(config.neighborhood_radius.min(MAX_NEIGHBORHOOD_RADIUS)).unwrap_or(1),
            last_viewer_cell: None,
            areas_changed: false,
            center: None,
            active: BTreeSet::new(),
        }
    }

    /// Forces a refresh on the next update.
    pub fn notify_areas_changed(&mut self) {
        debug!("area topology changed, visibility refresh scheduled");
        self.areas_changed = true;
    }

    /// Updates the active set and writes activation flags onto every cell.
    ///
    /// Returns true if any cell's activation changed. A ray-cast miss leaves
    /// the previous active set in effect and commits nothing, so the next
    /// update retries from the same trigger.
    pub fn update_active_areas<R>(
        &mut self,
        pose: &ViewerPose,
        registry: &mut AreaRegistry,
        raycaster: &R,
    ) -> bool
    where
        R: AreaRaycaster + ?Sized,
    {
        if registry.is_empty() {
            return false;
        }
        let Some(viewer_cell) = self.pending_cell(pose) else {
            return false;
        };

        let Some(center) = raycaster.raycast(pose.position, pose.forward, self.visible_distance, registry)
        else {
            debug!("visibility ray missed, keeping previous active set");
            return false;
        };

        self.last_viewer_cell = Some(viewer_cell);
        self.areas_changed = false;
        self.center = Some(center);
        self.active.clear();
        for dz in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                self.active.insert(center.offset(dx, dz));
            }
        }

        let changed = registry.apply_active_set(&self.active);
        debug!(
            x = center.x,
            z = center.z,
            active = registry.active_cells().count(),
            changed,
            "visibility recomputed"
        );
        changed
    }

    /// The viewer cell to commit if this pose needs a refresh.
    fn pending_cell(&self, pose: &ViewerPose) -> Option<CellCoord> {
        let cell = CellCoord::from_world(pose.position, self.cell_size);
        (self.areas_changed || self.last_viewer_cell != Some(cell)).then_some(cell)
    }

    /// Returns true if `coord` is in the active set.
    #[must_use]
    pub fn is_active(&self, coord: CellCoord) -> bool {
        self.active.contains(&coord)
    }

    /// The active set, in coordinate order.
    #[must_use]
    pub const fn active_coords(&self) -> &BTreeSet<CellCoord> {
        &self.active
    }

    /// The cell the active set is centered on.
    #[must_use]
    pub const fn center(&self) -> Option<CellCoord> {
        self.center
    }

    /// Edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }
}
