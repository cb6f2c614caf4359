//! Geometry kernel adapter layer
//!
//! Provides the adapter trait the host implements, the immutable B-rep
//! snapshot types it produces, an in-memory adapter and extrusion builders.

mod builders;
mod memory;
mod traits;

pub use builders::{MonolithDimensions, ProfileEdge, ProfileLoop, SnapshotBuilder};
pub use memory::SnapshotKernel;
pub use traits::*;
