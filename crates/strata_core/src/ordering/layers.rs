//! Sorting layers and the combined layer-and-order key.

use serde::{Deserialize, Serialize};

/// Spacing between sorting layers in the combined key.
///
/// In-layer orders must stay within `(-LAYER_BASE, LAYER_BASE)` to keep
/// layers from overlapping.
pub const LAYER_BASE: i32 = 100_000;

/// Combines a sorting layer index and an in-layer order into one key.
#[inline]
#[must_use]
pub const fn layer_and_order(layer_index: i32, order_in_layer: i32) -> i32 {
    layer_index * LAYER_BASE + order_in_layer
}

/// Ordered registry of named sorting layers.
///
/// Layer position in the list is its index; earlier layers draw first.
/// Serializes as a plain list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortingLayers {
    names: Vec<String>,
}

impl SortingLayers {
    /// Creates a registry from layer names in draw order.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the index of a named layer.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Computes the layer-and-order key for a named layer.
    ///
    /// Unknown layers fall back to index 0.
    #[must_use]
    pub fn key(&self, name: &str, order_in_layer: i32) -> i32 {
        let index = self
            .index_of(name)
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(0);
        layer_and_order(index, order_in_layer)
    }

    /// Returns the number of registered layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no layers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SortingLayers {
    fn default() -> Self {
        Self::new(["Default"])
    }
}
