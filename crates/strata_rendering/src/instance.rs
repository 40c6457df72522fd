//! Instance records and their GPU packing.

use bytemuck::{Pod, Zeroable};
use strata_core::{DrawOrdered, SortCamera, SortKey};

/// Size of one `float4` in bytes.
pub const FLOAT4_SIZE: usize = 16;
/// Size of a packed 3x4 affine transform in bytes.
pub const PACKED_TRANSFORM_SIZE: usize = FLOAT4_SIZE * 3;
/// Bytes uploaded per instance (packed transform + color).
pub const BYTES_PER_INSTANCE: usize = PACKED_TRANSFORM_SIZE + FLOAT4_SIZE;

/// A 3x4 affine transform as three `float4`s.
pub type PackedTransform = [[f32; 4]; 3];

/// One static renderable instance.
///
/// Computed once per source renderer and camera change; immutable for the
/// frame. The transform is column-major (`transform[column][row]`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceRecord {
    /// Object-to-world transform, column-major.
    pub transform: [[f32; 4]; 4],
    /// RGBA color.
    pub color: [f32; 4],
    /// World-space position (translation of `transform`).
    pub world_position: [f32; 3],
    /// Secondary sort key.
    pub distance: f32,
    /// Primary sort key.
    pub layer_and_order: i32,
}

impl InstanceRecord {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a record from a full transform.
    #[must_use]
    pub fn new(transform: [[f32; 4]; 4], color: [f32; 4], layer_and_order: i32, distance: f32) -> Self {
        let t = transform[3];
        Self {
            transform,
            color,
            world_position: [t[0], t[1], t[2]],
            distance,
            layer_and_order,
        }
    }

    /// Creates a translation-only record.
    #[must_use]
    pub fn at(position: [f32; 3], color: [f32; 4], layer_and_order: i32, distance: f32) -> Self {
        let [x, y, z] = position;
        Self::new(
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
            color,
            layer_and_order,
            distance,
        )
    }

    /// Returns a copy with the distance re-evaluated for `camera`.
    #[must_use]
    pub fn with_sort_distance(mut self, camera: &SortCamera) -> Self {
        self.distance = camera.sort_distance(self.world_position);
        self
    }

    /// Packs the transform into the 3x4 upload layout.
    #[inline]
    #[must_use]
    pub fn packed_transform(&self) -> PackedTransform {
        pack_transform(&self.transform)
    }
}

impl DrawOrdered for InstanceRecord {
    #[inline]
    fn sort_key(&self) -> SortKey {
        SortKey::new(self.layer_and_order, self.distance)
    }
}

/// Drops the constant bottom row of an affine transform.
///
/// The xyz of each column is written back to back, four floats per `float4`:
///
/// ```text
/// [c0.x c0.y c0.z c1.x] [c1.y c1.z c2.x c2.y] [c2.z c3.x c3.y c3.z]
/// ```
#[inline]
#[must_use]
pub fn pack_transform(m: &[[f32; 4]; 4]) -> PackedTransform {
    [
        [m[0][0], m[0][1], m[0][2], m[1][0]],
        [m[1][1], m[1][2], m[2][0], m[2][1]],
        [m[2][2], m[3][0], m[3][1], m[3][2]],
    ]
}
