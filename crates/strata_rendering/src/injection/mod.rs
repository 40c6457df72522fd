//! # Dynamic Object Injection
//!
//! Splices moving objects into the static sequence without re-sorting it.
//!
//! Each frame the injector fingerprints every dynamic object's sort fields
//! and compares them with the previous frame. Only when something changed
//! does it rebuild its data; insertion indices are then found by binary
//! search, **O(m log n)** for m objects over n static instances.

mod object;

pub use object::{
    sort_fingerprint, DynamicObjectData, DynamicObjectDesc, DynamicRenderable, InsertionPoint,
    ObjectId,
};

use std::collections::HashMap;

use strata_core::{lower_bound, SortCamera};
use tracing::trace;

use crate::instance::InstanceRecord;

/// Tracks dynamic objects and their insertion points.
#[derive(Debug)]
pub struct DynamicObjectInjector {
    objects: Vec<DynamicObjectData>,
    scratch: Vec<DynamicObjectData>,
    previous: HashMap<ObjectId, u64>,
    insertion_points: Vec<InsertionPoint>,
    dirty: bool,
    force: bool,
}

impl Default for DynamicObjectInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicObjectInjector {
    /// Creates an empty injector. It starts dirty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            scratch: Vec::new(),
            previous: HashMap::new(),
            insertion_points: Vec::new(),
            dirty: true,
            force: true,
        }
    }

    /// Re-evaluates every object for `camera` and reports whether anything
    /// sort-affecting changed since the last update.
    ///
    /// On a cache hit the stored data is left untouched.
    pub fn update<R>(&mut self, objects: &[R], camera: &SortCamera) -> bool
    where
        R: DynamicRenderable,
    {
        self.scratch.clear();
        self.scratch.extend(objects.iter().map(|object| {
            let position = object.world_position();
            DynamicObjectData::new(
                object.id(),
                position,
                camera.sort_distance(position),
                object.layer_and_order(),
            )
        }));

        let changed = std::mem::take(&mut self.force)
            || self.scratch.len() != self.objects.len()
            || self
                .scratch
                .iter()
                .any(|data| self.previous.get(&data.id) != Some(&data.fingerprint));

        if changed {
            std::mem::swap(&mut self.objects, &mut self.scratch);
            self.previous.clear();
            self.previous
                .extend(self.objects.iter().map(|data| (data.id, data.fingerprint)));
            trace!(objects = self.objects.len(), "dynamic objects changed");
        }

        self.dirty = changed;
        changed
    }

    /// Computes each object's insertion index into `sequence`.
    ///
    /// The index is the first element that does not precede the object, so
    /// ties place the object before equal static entries.
    pub fn calculate_insertion_points(&mut self, sequence: &[InstanceRecord]) -> &[InsertionPoint] {
        self.insertion_points.clear();
        for object in &mut self.objects {
            let index = lower_bound(sequence, &*object);
            object.insertion_index = index;
            self.insertion_points.push(InsertionPoint {
                index,
                position: object.position,
            });
        }
        &self.insertion_points
    }

    /// Insertion points from the last calculation, one per object.
    #[must_use]
    pub fn insertion_points(&self) -> &[InsertionPoint] {
        &self.insertion_points
    }

    /// Current object data.
    #[must_use]
    pub fn objects(&self) -> &[DynamicObjectData] {
        &self.objects
    }

    /// Objects whose insertion index lies in `(start, end]`.
    ///
    /// An object splices in after the last static entry of the range, so a
    /// range ending at the object's index claims it.
    pub fn get_dynamic_objects_between(
        &self,
        start: usize,
        end: usize,
    ) -> impl Iterator<Item = &DynamicObjectData> {
        self.objects
            .iter()
            .filter(move |o| o.insertion_index > start && o.insertion_index <= end)
    }

    /// Forces the next frame to treat the objects as changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.force = true;
    }

    /// Whether the last update found changes (or a dirty mark is pending).
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(id: u64, z: f32) -> DynamicObjectDesc {
        DynamicObjectDesc {
            id: ObjectId(id),
            position: [0.0, 0.0, z],
            layer_and_order: 0,
        }
    }

    fn camera() -> SortCamera {
        SortCamera::default().with_mode(strata_core::SortMode::CustomAxis, [0.0, 0.0, -1.0])
    }

    fn sequence(distances: &[f32]) -> Vec<InstanceRecord> {
        distances
            .iter()
            .map(|&d| InstanceRecord::at([0.0; 3], [1.0; 4], 0, d))
            .collect()
    }

    #[test]
    fn test_starts_dirty_then_caches() {
        let mut injector = DynamicObjectInjector::new();
        assert!(injector.is_dirty());

        let objects = [desc(1, 3.0), desc(2, 5.0)];
        assert!(injector.update(&objects, &camera()));
        assert!(!injector.update(&objects, &camera()));
        assert!(!injector.is_dirty());
    }

    #[test]
    fn test_detects_moves_additions_and_swaps() {
        let mut injector = DynamicObjectInjector::new();
        injector.update(&[desc(1, 3.0)], &camera());

        assert!(injector.update(&[desc(1, 4.0)], &camera()));
        assert!(injector.update(&[desc(1, 4.0), desc(2, 0.0)], &camera()));
        // Same count, new identity.
        assert!(injector.update(&[desc(1, 4.0), desc(3, 0.0)], &camera()));
    }

    #[test]
    fn test_insertion_between_ten_and_eleven() {
        // CustomAxis along -Z: distance == z.
        let seq = sequence(&(0..20).map(|i| i as f32).collect::<Vec<_>>());
        let mut injector = DynamicObjectInjector::new();
        injector.update(&[desc(7, 10.5)], &camera());

        let points = injector.calculate_insertion_points(&seq);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].index, 11);
        assert_eq!(injector.objects()[0].insertion_index, 11);
    }

    #[test]
    fn test_ties_insert_before_equal_entries() {
        let seq = sequence(&[1.0, 2.0, 2.0, 3.0]);
        let mut injector = DynamicObjectInjector::new();
        injector.update(&[desc(1, 2.0)], &camera());
        assert_eq!(injector.calculate_insertion_points(&seq)[0].index, 1);
    }

    #[test]
    fn test_objects_between() {
        let seq = sequence(&[0.0, 1.0, 2.0, 3.0]);
        let mut injector = DynamicObjectInjector::new();
        injector.update(&[desc(1, -1.0), desc(2, 1.5), desc(3, 1.5), desc(4, 9.0)], &camera());
        injector.calculate_insertion_points(&seq);

        let at_two: Vec<u64> = injector.get_dynamic_objects_between(1, 2).map(|o| o.id.0).collect();
        assert_eq!(at_two, vec![2, 3]);
        assert_eq!(injector.get_dynamic_objects_between(2, 3).count(), 0);
        // Start is exclusive: index 0 is never claimed.
        assert_eq!(injector.get_dynamic_objects_between(0, 1).count(), 0);
        assert_eq!(injector.get_dynamic_objects_between(3, 4).count(), 1);
    }

    #[test]
    fn test_objects_between_claims_range_end() {
        let seq = sequence(&(0..20).map(|i| i as f32).collect::<Vec<_>>());
        let mut injector = DynamicObjectInjector::new();
        injector.update(&[desc(7, 10.5)], &camera());
        injector.calculate_insertion_points(&seq);

        assert_eq!(injector.get_dynamic_objects_between(0, 11).count(), 1);
        assert_eq!(injector.get_dynamic_objects_between(11, 20).count(), 0);
    }

    #[test]
    fn test_idempotent_update_keeps_points() {
        let seq = sequence(&[0.0, 1.0, 2.0]);
        let objects = [desc(1, 0.5)];
        let mut injector = DynamicObjectInjector::new();
        injector.update(&objects, &camera());
        let before = injector.calculate_insertion_points(&seq).to_vec();

        assert!(!injector.update(&objects, &camera()));
        assert_eq!(injector.insertion_points(), before.as_slice());
    }

    #[test]
    fn test_mark_dirty_forces_rebuild() {
        let objects = [desc(1, 0.5)];
        let mut injector = DynamicObjectInjector::new();
        injector.update(&objects, &camera());
        injector.mark_dirty();
        assert!(injector.is_dirty());
        assert!(injector.update(&objects, &camera()));
    }

    #[test]
    fn test_mark_dirty_without_objects() {
        let none: [DynamicObjectDesc; 0] = [];
        let mut injector = DynamicObjectInjector::new();
        assert!(injector.update(&none, &camera()));
        assert!(!injector.update(&none, &camera()));
        injector.mark_dirty();
        assert!(injector.update(&none, &camera()));
    }
}
