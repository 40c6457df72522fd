//! Sort-distance evaluation.
//!
//! Converts a world-space center into the secondary sort key. Lower values
//! draw first under every mode.

use serde::{Deserialize, Serialize};

/// How the secondary sort key is derived from a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Negated squared distance to the viewer: farther objects draw first.
    #[default]
    Perspective,
    /// View-space depth along the viewer's forward axis.
    Orthographic,
    /// Negated projection onto a fixed world axis (e.g. Y for 2D games).
    CustomAxis,
}

/// Viewer description used to evaluate sort distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortCamera {
    /// Viewer position.
    pub position: [f32; 3],
    /// Viewer forward direction (need not be normalized for sorting).
    pub forward: [f32; 3],
    /// Evaluation mode.
    pub mode: SortMode,
    /// Axis used by [`SortMode::CustomAxis`].
    pub axis: [f32; 3],
}

impl SortCamera {
    /// Creates a perspective sort camera.
    #[must_use]
    pub const fn perspective(position: [f32; 3], forward: [f32; 3]) -> Self {
        Self {
            position,
            forward,
            mode: SortMode::Perspective,
            axis: [0.0, 0.0, 1.0],
        }
    }

    /// Returns a copy using the given mode and custom axis.
    #[must_use]
    pub const fn with_mode(mut self, mode: SortMode, axis: [f32; 3]) -> Self {
        self.mode = mode;
        self.axis = axis;
        self
    }

    /// Distance of `center` along the view direction.
    #[inline]
    #[must_use]
    pub fn view_depth(&self, center: [f32; 3]) -> f32 {
        dot(self.forward, sub(center, self.position))
    }

    /// Evaluates the sort distance of `center` for this viewer.
    #[must_use]
    pub fn sort_distance(&self, center: [f32; 3]) -> f32 {
        match self.mode {
            SortMode::Perspective => {
                let offset = sub(center, self.position);
                -dot(offset, offset)
            }
            // View space looks down -Z.
            SortMode::Orthographic => -self.view_depth(center),
            SortMode::CustomAxis => -dot(self.axis, center),
        }
    }
}

impl Default for SortCamera {
    fn default() -> Self {
        Self::perspective([0.0; 3], [0.0, 0.0, 1.0])
    }
}

#[inline]
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
