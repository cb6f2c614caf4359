//! Geometry primitives shared by the extraction kernel
//!
//! - [`Plane`]: cutting plane with its local 2D frame
//! - [`ArcDescriptor`]: circular arc metadata and sampling
//! - [`polygon`]: shoelace area, centroid, containment and segment predicates

mod arc;
mod plane;
pub mod polygon;

pub use arc::ArcDescriptor;
pub use plane::Plane;
