//! # Memory Management
//!
//! Pre-allocated buffers and pools for allocation-free frames.
//!
//! ## Design Philosophy
//!
//! GPU-sized memory is allocated once at startup. During a frame:
//! - Per-frame output goes into a [`FrameArena`] that is reset, not freed
//! - Long-lived resources are recycled through a bounded [`Pool`]
//! - Exhaustion is reported to the caller, never blocks

mod arena;
mod pool;

pub use arena::{FrameArena, FrameScope};
pub use pool::{Pool, PoolHandle};
