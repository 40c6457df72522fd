//! Ray queries against area cells.

use crate::area::{AreaRegistry, CellCoord};

/// Finds the area cell a viewer is looking at.
///
/// Hosts with a physics engine implement this against their cell colliders.
pub trait AreaRaycaster {
    /// Returns the nearest cell hit by the ray within `max_distance`.
    fn raycast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
        registry: &AreaRegistry,
    ) -> Option<CellCoord>;
}

/// Ray caster that slab-tests the registered cell bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsRaycaster;

impl AreaRaycaster for BoundsRaycaster {
    fn raycast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
        registry: &AreaRegistry,
    ) -> Option<CellCoord> {
        registry
            .cells()
            .filter_map(|cell| {
                cell.bounds()
                    .ray_intersect(origin, direction, max_distance)
                    .map(|t| (t, cell.coord()))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, coord)| coord)
    }
}
