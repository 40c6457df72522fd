//! # Area Cells
//!
//! The world is partitioned into fixed-size cells on the XZ plane. Each cell
//! owns its static instances, kept sorted by the draw-order relation, and an
//! activation flag written by the visibility detector.

use std::collections::{BTreeMap, BTreeSet};

use strata_core::compare_draw_order;
use tracing::debug;

use crate::instance::InstanceRecord;

/// Integer grid coordinate of an area cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl CellCoord {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the cell containing a world position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_world(position: [f32; 3], cell_size: f32) -> Self {
        Self {
            x: (position[0] / cell_size).floor() as i32,
            z: (position[2] / cell_size).floor() as i32,
        }
    }

    /// The row this cell belongs to when grouping for sorting.
    #[inline]
    #[must_use]
    pub const fn row(self) -> i32 {
        self.z
    }

    /// Returns the coordinate offset by `(dx, dz)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Creates a new box.
    #[must_use]
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Creates the box covering a grid cell between `min_y` and `max_y`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_cell(coord: CellCoord, cell_size: f32, min_y: f32, max_y: f32) -> Self {
        let min_x = coord.x as f32 * cell_size;
        let min_z = coord.z as f32 * cell_size;
        Self {
            min: [min_x, min_y, min_z],
            max: [min_x + cell_size, max_y, min_z + cell_size],
        }
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Returns true if the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: [f32; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Slab test. Returns the entry distance along `direction` if the ray
    /// hits the box within `max_distance`.
    ///
    /// A ray starting inside the box hits at distance 0.
    #[must_use]
    pub fn ray_intersect(&self, origin: [f32; 3], direction: [f32; 3], max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// A fixed-size spatial partition holding pre-sorted static instances.
#[derive(Debug, Clone)]
pub struct AreaCell {
    coord: CellCoord,
    bounds: Aabb,
    instances: Vec<InstanceRecord>,
    active: bool,
}

impl AreaCell {
    /// Creates a cell. The instances are stably sorted by draw order.
    #[must_use]
    pub fn new(coord: CellCoord, bounds: Aabb, mut instances: Vec<InstanceRecord>) -> Self {
        instances.sort_by(compare_draw_order);
        Self {
            coord,
            bounds,
            instances,
            active: false,
        }
    }

    /// Grid coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World-space bounds.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Instances in draw order.
    #[inline]
    #[must_use]
    pub fn instances(&self) -> &[InstanceRecord] {
        &self.instances
    }

    /// Number of instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if the cell has no instances.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether the cell is in the active set.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Sets the activation flag. Returns true if it changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }
}

/// All known area cells, keyed by coordinate.
///
/// Registration and removal raise a topology flag that the frame pipeline
/// consumes to force a visibility refresh.
#[derive(Debug, Default)]
pub struct AreaRegistry {
    cells: BTreeMap<CellCoord, AreaCell>,
    topology_changed: bool,
}

impl AreaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell, replacing any cell at the same coordinate.
    pub fn register(&mut self, cell: AreaCell) -> Option<AreaCell> {
        let coord = cell.coord();
        debug!(x = coord.x, z = coord.z, instances = cell.len(), "area registered");
        self.topology_changed = true;
        self.cells.insert(coord, cell)
    }

    /// Removes the cell at `coord`.
    pub fn unregister(&mut self, coord: CellCoord) -> Option<AreaCell> {
        let removed = self.cells.remove(&coord);
        if removed.is_some() {
            debug!(x = coord.x, z = coord.z, "area unregistered");
            self.topology_changed = true;
        }
        removed
    }

    /// Returns the cell at `coord`.
    #[must_use]
    pub fn get(&self, coord: CellCoord) -> Option<&AreaCell> {
        self.cells.get(&coord)
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cells are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over every cell in coordinate order.
    pub fn cells(&self) -> impl Iterator<Item = &AreaCell> {
        self.cells.values()
    }

    /// Iterates over active cells in coordinate order.
    pub fn active_cells(&self) -> impl Iterator<Item = &AreaCell> {
        self.cells.values().filter(|c| c.is_active())
    }

    /// Total instances across active cells.
    #[must_use]
    pub fn active_instance_count(&self) -> usize {
        self.active_cells().map(AreaCell::len).sum()
    }

    /// Returns true if cells were added or removed since the last
    /// [`AreaRegistry::take_topology_changed`].
    #[must_use]
    pub const fn topology_changed(&self) -> bool {
        self.topology_changed
    }

    /// Returns and clears the topology flag.
    pub fn take_topology_changed(&mut self) -> bool {
        std::mem::take(&mut self.topology_changed)
    }

    /// Writes the activation flag of every cell from `active`.
    ///
    /// Returns true if any flag changed.
    pub fn apply_active_set(&mut self, active: &BTreeSet<CellCoord>) -> bool {
        let mut changed = false;
        for (coord, cell) in &mut self.cells {
            changed |= cell.set_active(active.contains(coord));
        }
        changed
    }
}
