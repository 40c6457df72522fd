//! # Renderer Configuration
//!
//! All tunables are loaded once at startup from TOML:
//!
//! ```toml
//! [visibility]
//! cell_size = 16.0
//! visible_distance = 100.0
//! neighborhood_radius = 1
//!
//! [sorting]
//! min_merge_rows = 3
//! sort_mode = "custom_axis"
//! sort_axis = [0.0, 1.0, 0.0]
//! layers = ["Background", "Default", "Foreground"]
//!
//! [batching]
//! batch_capacity = 1024
//! initial_pool_size = 8
//! max_pool_size = 32
//! pack_chunk_size = 64
//! ```
//!
//! Missing sections and keys fall back to the defaults above.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{SortCamera, SortMode, SortingLayers};

use crate::error::{StrataError, StrataResult};

/// Largest accepted `visibility.neighborhood_radius` (a 17x17 neighborhood).
///
/// Activation visits `(2r + 1)^2` cells per update.
pub const MAX_NEIGHBORHOOD_RADIUS: u32 = 8;

/// Top-level renderer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Area activation settings.
    pub visibility: VisibilityConfig,
    /// Row sort and merge settings.
    pub sorting: SortingConfig,
    /// Batch pool settings.
    pub batching: BatchingConfig,
    /// Single-window renderer settings.
    pub flat: FlatConfig,
}

/// Area activation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Edge length of one area cell in world units.
    pub cell_size: f32,
    /// Maximum ray length when picking the looked-at cell.
    pub visible_distance: f32,
    /// Active neighborhood radius in cells (1 = 3x3).
    pub neighborhood_radius: u32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            cell_size: 16.0,
            visible_distance: 100.0,
            neighborhood_radius: 1,
        }
    }
}

/// Row sort and merge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// Fewer active rows than this are concatenated without merging.
    pub min_merge_rows: usize,
    /// How dynamic-object sort distances are evaluated.
    pub sort_mode: SortMode,
    /// Axis for [`SortMode::CustomAxis`].
    pub sort_axis: [f32; 3],
    /// Named sorting layers in draw order.
    pub layers: SortingLayers,
}

impl SortingConfig {
    /// Builds the sort camera for a viewer pose under this configuration.
    #[must_use]
    pub fn sort_camera(&self, position: [f32; 3], forward: [f32; 3]) -> SortCamera {
        SortCamera::perspective(position, forward).with_mode(self.sort_mode, self.sort_axis)
    }

    /// Layer-and-order key for a named layer. Unknown names use layer 0.
    #[must_use]
    pub fn layer_key(&self, layer: &str, order_in_layer: i32) -> i32 {
        self.layers.key(layer, order_in_layer)
    }
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            min_merge_rows: 3,
            sort_mode: SortMode::Perspective,
            sort_axis: [0.0, 0.0, 1.0],
            layers: SortingLayers::default(),
        }
    }
}

/// Batch pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Instances per batch.
    pub batch_capacity: usize,
    /// Batches created eagerly at startup.
    pub initial_pool_size: usize,
    /// Hard ceiling on batches.
    pub max_pool_size: usize,
    /// Instances per parallel packing task.
    pub pack_chunk_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_capacity: 1024,
            initial_pool_size: 8,
            max_pool_size: 32,
            pack_chunk_size: 64,
        }
    }
}

/// Single-window renderer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatConfig {
    /// Maximum instances drawn by the single window.
    pub max_instances: usize,
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            max_instances: 65_536,
        }
    }
}

impl StrataConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ConfigParse`] for malformed TOML and
    /// [`StrataError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> StrataResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StrataError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ConfigIo`] if the file cannot be read, otherwise
    /// the errors of [`StrataConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StrataError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every value for range errors.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] naming the first bad key.
    pub fn validate(&self) -> StrataResult<()> {
        let v = &self.visibility;
        if !v.cell_size.is_finite() || v.cell_size <= 0.0 {
            return Err(invalid("visibility.cell_size must be finite and > 0"));
        }
        if !v.visible_distance.is_finite() || v.visible_distance <= 0.0 {
            return Err(invalid("visibility.visible_distance must be finite and > 0"));
        }
        if v.neighborhood_radius > MAX_NEIGHBORHOOD_RADIUS {
            return Err(StrataError::InvalidConfig(format!(
                "visibility.neighborhood_radius must be <= {MAX_NEIGHBORHOOD_RADIUS}"
            )));
        }
        if self.sorting.min_merge_rows == 0 {
            return Err(invalid("sorting.min_merge_rows must be >= 1"));
        }
        if self.sorting.layers.is_empty() {
            return Err(invalid("sorting.layers must name at least one layer"));
        }

        let b = &self.batching;
        if b.batch_capacity == 0 {
            return Err(invalid("batching.batch_capacity must be > 0"));
        }
        if b.max_pool_size == 0 {
            return Err(invalid("batching.max_pool_size must be > 0"));
        }
        if b.initial_pool_size > b.max_pool_size {
            return Err(invalid(
                "batching.initial_pool_size must not exceed batching.max_pool_size",
            ));
        }
        if b.pack_chunk_size == 0 {
            return Err(invalid("batching.pack_chunk_size must be > 0"));
        }
        if self.flat.max_instances == 0 {
            return Err(invalid("flat.max_instances must be > 0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> StrataError {
    StrataError::InvalidConfig(message.to_owned())
}
