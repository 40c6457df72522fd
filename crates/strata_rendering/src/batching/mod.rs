//! # Batch Pool
//!
//! Fixed-capacity GPU batches recycled through a bounded pool.
//!
//! ## Buffer layout
//!
//! Every batch owns a fixed slice of one persistent buffer, computed from its
//! pool slot when it is created:
//!
//! ```text
//! batch i: [ capacity × packed transform (48 B) | capacity × color (16 B) ]
//!          ^ i * capacity * 64                  ^ + capacity * 48
//! ```
//!
//! No GPU allocation happens after startup. Only the touched prefix of each
//! block is uploaded.

mod assign;
mod batch;
mod pool;
mod upload;

pub use assign::{AssignStats, BatchAssigner};
pub use batch::{Batch, BatchState};
pub(crate) use batch::{pack_instances, TRANSFORM_FLOAT4S};
pub use pool::{BatchPool, PoolStats};
pub use upload::{create_instance_buffer, HostUploadBuffer, UploadTarget, WgpuUploadTarget};
