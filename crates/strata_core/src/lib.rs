//! # Strata Core
//!
//! Engine-independent primitives for painter's-order instance rendering:
//! - A single draw-order relation shared by static instances and dynamic objects
//! - Sort-distance evaluation for the supported viewer conventions
//! - Pre-allocated frame memory (arenas and bounded pools)
//!
//! ## Architecture Rules
//!
//! 1. **One ordering relation** - every sort, merge and binary search uses
//!    [`compare_draw_order`]
//! 2. **No per-frame GPU-sized allocation** - buffers are reserved once and
//!    recycled
//! 3. **Single frame thread** - pools and arenas are not `Sync`; callers serialize
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{lower_bound, SortKey};
//!
//! let sequence = [SortKey::new(0, 1.0), SortKey::new(0, 3.0), SortKey::new(1, 0.0)];
//! assert_eq!(lower_bound(&sequence, &SortKey::new(0, 2.0)), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod ordering;

pub use memory::{FrameArena, FrameScope, Pool, PoolHandle};
pub use ordering::{
    compare_draw_order, layer_and_order, lower_bound, precedes, DrawOrdered, SortCamera,
    SortKey, SortMode, SortingLayers, LAYER_BASE,
};
