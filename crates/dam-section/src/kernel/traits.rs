//! Geometry kernel adapter trait and B-rep snapshot types
//!
//! A host CAD application implements [`GeometryKernelAdapter`] to hand the
//! extraction kernel an immutable [`BrepSnapshot`]. Nothing host-specific
//! crosses this boundary: snapshots are plain serializable values.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::ArcDescriptor;

/// Unique identifier for a face within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId {
    /// ID of the solid this face belongs to
    pub solid_id: Uuid,
    /// Index of the face within the solid
    pub index: u32,
}

impl FaceId {
    /// Create a new face ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Underlying surface of a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FaceSurface {
    /// Flat face with a unit normal
    Planar {
        /// Outward unit normal
        normal: DVec3,
    },
    /// Portion of a circular cylinder
    Cylindrical {
        /// A point on the cylinder axis
        origin: DVec3,
        /// Unit direction of the axis
        axis: DVec3,
        /// Cylinder radius
        radius: f64,
    },
    /// Any other curved surface; only its boundary edges are known
    Freeform,
}

/// A boundary edge of a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    /// Start point
    pub start: DVec3,
    /// End point
    pub end: DVec3,
    /// Arc metadata when the edge is a circular arc
    #[serde(default)]
    pub arc: Option<ArcDescriptor>,
}

impl EdgeSnapshot {
    /// Straight edge
    pub fn line(start: DVec3, end: DVec3) -> Self {
        Self {
            start,
            end,
            arc: None,
        }
    }

    /// Circular arc edge
    pub fn arc(start: DVec3, end: DVec3, arc: ArcDescriptor) -> Self {
        Self {
            start,
            end,
            arc: Some(arc),
        }
    }

    /// The same edge traversed end to start
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            arc: self.arc.map(|a| a.reversed()),
        }
    }

    /// Polyline through the edge; straight edges yield their two endpoints
    pub fn polyline(&self, arc_chords: u32) -> Vec<DVec3> {
        match &self.arc {
            Some(arc) => arc.sample(self.start, self.end, arc_chords),
            None => vec![self.start, self.end],
        }
    }
}

/// A face of the solid with its ordered boundary edges.
///
/// Edges are ordered head-to-tail within each boundary loop; faces with holes
/// list their loops one after another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSnapshot {
    /// Face identifier
    pub id: FaceId,
    /// Underlying surface
    pub surface: FaceSurface,
    /// Ordered boundary edges
    pub edges: Vec<EdgeSnapshot>,
}

impl FaceSnapshot {
    /// Create a planar face
    pub fn planar(id: FaceId, normal: DVec3, edges: Vec<EdgeSnapshot>) -> Self {
        Self {
            id,
            surface: FaceSurface::Planar {
                normal: normal.normalize(),
            },
            edges,
        }
    }

    /// Planarity flag
    pub fn is_planar(&self) -> bool {
        matches!(self.surface, FaceSurface::Planar { .. })
    }

    /// Unit normal of a planar face
    pub fn normal(&self) -> Option<DVec3> {
        match self.surface {
            FaceSurface::Planar { normal } => Some(normal),
            _ => None,
        }
    }
}

/// Axis-aligned bounding box of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl BoundingBox {
    /// The eight corners of the box
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }
}

/// Immutable boundary-representation snapshot of one solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrepSnapshot {
    /// Identifier of the solid in the host document
    pub solid_id: Uuid,
    /// Display name
    pub name: String,
    /// Bounding faces
    pub faces: Vec<FaceSnapshot>,
}

impl BrepSnapshot {
    /// Create a snapshot from its faces
    pub fn new(solid_id: Uuid, name: impl Into<String>, faces: Vec<FaceSnapshot>) -> Self {
        Self {
            solid_id,
            name: name.into(),
            faces,
        }
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Bounding box over all edge points; arcs contribute their full circle extent
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut points = self.faces.iter().flat_map(|f| f.edges.iter()).flat_map(|e| {
            let mut pts = vec![e.start, e.end];
            if let Some(arc) = &e.arc {
                pts.push(arc.center - DVec3::splat(arc.radius));
                pts.push(arc.center + DVec3::splat(arc.radius));
            }
            pts
        });
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(BoundingBox { min, max })
    }

    /// Check basic well-formedness: at least one face, every face has edges,
    /// planar normals are unit length and all coordinates are finite
    pub fn check(&self) -> KernelResult<()> {
        if self.faces.is_empty() {
            return Err(KernelError::InvalidSnapshot(format!(
                "solid '{}' has no faces",
                self.name
            )));
        }
        for face in &self.faces {
            if face.edges.is_empty() {
                return Err(KernelError::InvalidSnapshot(format!(
                    "face {} has no boundary edges",
                    face.id.index
                )));
            }
            if let Some(normal) = face.normal()
                && (normal.length() - 1.0).abs() > 1e-6
            {
                return Err(KernelError::InvalidSnapshot(format!(
                    "face {} normal is not unit length",
                    face.id.index
                )));
            }
            if face
                .edges
                .iter()
                .any(|e| !e.start.is_finite() || !e.end.is_finite())
            {
                return Err(KernelError::InvalidSnapshot(format!(
                    "face {} has non-finite coordinates",
                    face.id.index
                )));
            }
        }
        Ok(())
    }
}

/// Error type for kernel adapter operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// No host kernel is attached
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    /// The requested solid is unknown to the adapter
    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    /// The snapshot failed a well-formedness check
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for kernel adapter operations
pub type KernelResult<T> = Result<T, KernelError>;

/// The geometry kernel adapter trait
///
/// Implemented by the host-side anti-corruption layer. The extraction kernel
/// only ever sees the snapshots it returns.
pub trait GeometryKernelAdapter: Send + Sync {
    /// Get the name of this adapter
    fn name(&self) -> &str;

    /// Check if the adapter can serve snapshots
    fn is_available(&self) -> bool;

    /// List the solids this adapter knows about
    fn solids(&self) -> Vec<Uuid>;

    /// Take an immutable snapshot of a solid's boundary representation
    ///
    /// # Arguments
    /// * `solid_id` - The solid to snapshot
    fn snapshot(&self, solid_id: Uuid) -> KernelResult<BrepSnapshot>;
}

/// A null adapter that always returns errors (used when no host is attached)
#[derive(Debug, Default)]
pub struct NullKernel;

impl GeometryKernelAdapter for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn solids(&self) -> Vec<Uuid> {
        Vec::new()
    }

    fn snapshot(&self, _solid_id: Uuid) -> KernelResult<BrepSnapshot> {
        Err(KernelError::KernelNotAvailable(
            "No geometry kernel attached".into(),
        ))
    }
}
