//! # Draw Ordering
//!
//! The painter's-algorithm relation used everywhere in Strata:
//!
//! ```text
//! primary:   layer-and-order key   (ascending)
//! secondary: sort distance         (ascending, caller-defined convention)
//! ```
//!
//! Static instance lists, row sorts, the k-way merge and the dynamic-object
//! binary search all go through [`compare_draw_order`], so a dynamic object
//! lands exactly where a static instance with the same key would.

mod depth;
mod key;
mod layers;

pub use depth::{SortCamera, SortMode};
pub use key::{compare_draw_order, lower_bound, precedes, DrawOrdered, SortKey};
pub use layers::{layer_and_order, SortingLayers, LAYER_BASE};
