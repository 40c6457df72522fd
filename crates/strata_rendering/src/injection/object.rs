//! Dynamic object descriptions and their per-frame data.

use std::hash::Hasher;

use siphasher::sip::SipHasher13;
use strata_core::{DrawOrdered, SortKey};

/// Stable identity of a dynamic object across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// A renderable whose position or sort key may change every frame.
pub trait DynamicRenderable {
    /// Stable identity.
    fn id(&self) -> ObjectId;
    /// Current world-space position.
    fn world_position(&self) -> [f32; 3];
    /// Current layer-and-order key.
    fn layer_and_order(&self) -> i32;
}

/// Plain dynamic object description for hosts without their own type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicObjectDesc {
    /// Identity.
    pub id: ObjectId,
    /// World-space position.
    pub position: [f32; 3],
    /// Layer-and-order key.
    pub layer_and_order: i32,
}

impl DynamicRenderable for DynamicObjectDesc {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn world_position(&self) -> [f32; 3] {
        self.position
    }

    fn layer_and_order(&self) -> i32 {
        self.layer_and_order
    }
}

/// Per-frame sort data for one dynamic object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicObjectData {
    /// Identity.
    pub id: ObjectId,
    /// World-space position.
    pub position: [f32; 3],
    /// Sort distance for the current viewer.
    pub distance: f32,
    /// Layer-and-order key.
    pub layer_and_order: i32,
    /// Hash of the sort-affecting fields.
    pub fingerprint: u64,
    /// Index into the static sequence this object is drawn before.
    pub insertion_index: usize,
}

impl DynamicObjectData {
    /// Creates data for an object; the insertion index starts at 0.
    #[must_use]
    pub fn new(id: ObjectId, position: [f32; 3], distance: f32, layer_and_order: i32) -> Self {
        Self {
            id,
            position,
            distance,
            layer_and_order,
            fingerprint: sort_fingerprint(distance, layer_and_order),
            insertion_index: 0,
        }
    }
}

impl DrawOrdered for DynamicObjectData {
    #[inline]
    fn sort_key(&self) -> SortKey {
        SortKey::new(self.layer_and_order, self.distance)
    }
}

/// Hashes the fields that decide an object's draw order.
///
/// Distances are hashed bitwise so any change, including sign of zero,
/// produces a new fingerprint.
#[must_use]
pub fn sort_fingerprint(distance: f32, layer_and_order: i32) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write_u32(distance.to_bits());
    hasher.write_i32(layer_and_order);
    hasher.finish()
}

/// Where a dynamic object splices into the static sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionPoint {
    /// Index into the sequence.
    pub index: usize,
    /// World position of the dynamic object.
    pub position: [f32; 3],
}
