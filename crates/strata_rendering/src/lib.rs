//! # Strata Rendering
//!
//! Painter's-order instanced rendering over a grid of tiled areas:
//! - Only the 3x3 neighborhood the viewer looks at is active
//! - Active rows are sorted in parallel and k-way merged into one sequence
//! - Moving objects are spliced in by binary search, never by re-sorting
//! - Static runs are drawn from a bounded pool of fixed-capacity batches
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          FRAME PIPELINE                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Viewer Pose → Visibility (ray cast) → Active Cells              │
//! │       ↓                                     ↓                    │
//! │  Dynamic Objects → Injector        Row Sort + K-Way Merge        │
//! │       ↓                                     ↓                    │
//! │  Insertion Points ─────────→ Render Ranges → Batch Pool → Queue  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - Re-sort only when the viewer crosses a cell boundary or cells change
//! - No GPU buffer allocation after startup
//! - Pool exhaustion and missing assets degrade the frame, never fail it

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod area;
pub mod batching;
pub mod config;
pub mod error;
pub mod injection;
pub mod instance;
pub mod pipeline;
pub mod queue;
pub mod ranges;
pub mod renderer;
pub mod sorting;
pub mod visibility;

pub use area::{Aabb, AreaCell, AreaRegistry, CellCoord};
pub use batching::{
    create_instance_buffer, Batch, BatchAssigner, BatchPool, BatchState, HostUploadBuffer,
    UploadTarget, WgpuUploadTarget,
};
pub use config::{
    BatchingConfig, FlatConfig, SortingConfig, StrataConfig, VisibilityConfig, MAX_NEIGHBORHOOD_RADIUS,
};
pub use error::{StrataError, StrataResult};
pub use injection::{
    DynamicObjectDesc, DynamicObjectInjector, DynamicRenderable, InsertionPoint, ObjectId,
};
pub use instance::InstanceRecord;
pub use pipeline::{FramePipeline, FrameStats};
pub use queue::{DrawCommand, MaterialHandle, MeshHandle, RenderQueue};
pub use ranges::{split_render_ranges, RangeKind, RenderRange};
pub use renderer::{BatchedRenderer, FlatRenderer, RenderManager, RendererStats, SequenceRenderer};
pub use sorting::AreaSorter;
pub use visibility::{AreaRaycaster, BoundsRaycaster, ViewerPose, VisibilityDetector};
