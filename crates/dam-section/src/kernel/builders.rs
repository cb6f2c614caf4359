//! Snapshot builders
//!
//! Extrude a closed 2D profile (line and arc edges, optional holes) along +Z
//! into a [`BrepSnapshot`]. Used for fixtures and for hosts that only know a
//! monolith's cross-section.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BrepSnapshot, EdgeSnapshot, FaceId, FaceSnapshot, FaceSurface};
use crate::geometry::{ArcDescriptor, polygon};

/// Chords used when estimating a profile loop's orientation
const ORIENTATION_SAMPLES: u32 = 8;

/// An edge of a 2D profile loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProfileEdge {
    /// Straight edge
    Line {
        /// Start point
        start: DVec2,
        /// End point
        end: DVec2,
    },
    /// Circular arc
    Arc {
        /// Start point
        start: DVec2,
        /// End point
        end: DVec2,
        /// Arc center
        center: DVec2,
        /// Counter-clockwise from start to end
        ccw: bool,
    },
}

impl ProfileEdge {
    fn reversed(&self) -> Self {
        match *self {
            ProfileEdge::Line { start, end } => ProfileEdge::Line {
                start: end,
                end: start,
            },
            ProfileEdge::Arc {
                start,
                end,
                center,
                ccw,
            } => ProfileEdge::Arc {
                start: end,
                end: start,
                center,
                ccw: !ccw,
            },
        }
    }

    /// Edge lifted to height `z`
    fn at_height(&self, z: f64) -> EdgeSnapshot {
        let lift = |p: DVec2| DVec3::new(p.x, p.y, z);
        match *self {
            ProfileEdge::Line { start, end } => EdgeSnapshot::line(lift(start), lift(end)),
            ProfileEdge::Arc {
                start,
                end,
                center,
                ccw,
            } => {
                let axis = if ccw { DVec3::Z } else { -DVec3::Z };
                let arc = ArcDescriptor::new(lift(center), (start - center).length(), axis);
                EdgeSnapshot::arc(lift(start), lift(end), arc)
            }
        }
    }
}

/// A closed loop of profile edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLoop {
    /// Edges, head to tail
    pub edges: Vec<ProfileEdge>,
}

impl ProfileLoop {
    /// Closed polygon through the given vertices
    pub fn polygon(points: &[DVec2]) -> Self {
        let n = points.len();
        let edges = (0..n)
            .map(|i| ProfileEdge::Line {
                start: points[i],
                end: points[(i + 1) % n],
            })
            .collect();
        Self { edges }
    }

    /// Full circle made of two half arcs
    pub fn circle(center: DVec2, radius: f64) -> Self {
        let right = center + DVec2::new(radius, 0.0);
        let left = center - DVec2::new(radius, 0.0);
        Self {
            edges: vec![
                ProfileEdge::Arc {
                    start: right,
                    end: left,
                    center,
                    ccw: true,
                },
                ProfileEdge::Arc {
                    start: left,
                    end: right,
                    center,
                    ccw: true,
                },
            ],
        }
    }

    /// Full circle as a single arc edge; extrudes to one seamed cylinder face
    pub fn full_circle(center: DVec2, radius: f64) -> Self {
        let seam = center + DVec2::new(radius, 0.0);
        Self {
            edges: vec![ProfileEdge::Arc {
                start: seam,
                end: seam,
                center,
                ccw: true,
            }],
        }
    }

    /// Signed area of the sampled loop
    pub fn signed_area(&self) -> f64 {
        let points: Vec<DVec2> = self
            .edges
            .iter()
            .flat_map(|e| {
                let edge = e.at_height(0.0);
                let mut pts = edge.polyline(ORIENTATION_SAMPLES);
                pts.pop();
                pts
            })
            .map(|p| p.truncate())
            .collect();
        polygon::signed_area(&points)
    }

    fn reversed(&self) -> Self {
        Self {
            edges: self.edges.iter().rev().map(|e| e.reversed()).collect(),
        }
    }

    fn oriented(&self, ccw: bool) -> Self {
        if (self.signed_area() > 0.0) == ccw {
            self.clone()
        } else {
            self.reversed()
        }
    }
}

/// Main dimensions of a trapezoidal gravity-dam monolith
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonolithDimensions {
    /// Width at the foundation
    pub base_width: f64,
    /// Width at the crest
    pub crest_width: f64,
    /// Height from foundation to crest
    pub height: f64,
    /// Horizontal run of the upstream face (0 for a vertical upstream face)
    pub upstream_run: f64,
}

impl MonolithDimensions {
    /// Profile vertices: upstream toe, downstream toe, downstream crest, upstream crest
    pub fn outline(&self) -> Vec<DVec2> {
        let up = self.upstream_run;
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(self.base_width, 0.0),
            DVec2::new(up + self.crest_width, self.height),
            DVec2::new(up, self.height),
        ]
    }
}

/// Builds a prismatic solid snapshot by extruding a profile along +Z
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    solid_id: Uuid,
    name: String,
    outer: ProfileLoop,
    holes: Vec<ProfileLoop>,
    length: f64,
}

impl SnapshotBuilder {
    /// Start a builder from an outer profile loop
    pub fn new(name: impl Into<String>, outer: ProfileLoop) -> Self {
        Self {
            solid_id: Uuid::new_v4(),
            name: name.into(),
            outer,
            holes: Vec::new(),
            length: 1.0,
        }
    }

    /// Rectangular block `width × height` in XY
    pub fn rectangular_block(width: f64, height: f64, length: f64) -> Self {
        let outline = [
            DVec2::new(0.0, 0.0),
            DVec2::new(width, 0.0),
            DVec2::new(width, height),
            DVec2::new(0.0, height),
        ];
        Self::new("block", ProfileLoop::polygon(&outline)).with_length(length)
    }

    /// Trapezoidal gravity-dam monolith
    pub fn gravity_monolith(dimensions: MonolithDimensions, length: f64) -> Self {
        Self::new("monolith", ProfileLoop::polygon(&dimensions.outline())).with_length(length)
    }

    /// Gravity-dam monolith with a circular inspection gallery
    pub fn galleried_monolith(
        dimensions: MonolithDimensions,
        length: f64,
        gallery_center: DVec2,
        gallery_radius: f64,
    ) -> Self {
        Self::gravity_monolith(dimensions, length)
            .with_name("galleried monolith")
            .with_hole(ProfileLoop::circle(gallery_center, gallery_radius))
    }

    /// Use a fixed solid ID (deterministic fixtures)
    pub fn with_solid_id(mut self, solid_id: Uuid) -> Self {
        self.solid_id = solid_id;
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a through hole (gallery, drain)
    pub fn with_hole(mut self, hole: ProfileLoop) -> Self {
        self.holes.push(hole);
        self
    }

    /// Set the extrusion length along +Z
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Build the snapshot
    pub fn extrude(&self) -> BrepSnapshot {
        let outer = self.outer.oriented(true);
        let holes: Vec<ProfileLoop> = self.holes.iter().map(|h| h.oriented(false)).collect();
        let loops: Vec<&ProfileLoop> = std::iter::once(&outer).chain(holes.iter()).collect();

        let mut faces = Vec::new();
        let mut next_id = 0u32;
        let mut face_id = || {
            let id = FaceId::new(self.solid_id, next_id);
            next_id += 1;
            id
        };

        // Caps
        let bottom: Vec<EdgeSnapshot> = loops
            .iter()
            .flat_map(|l| l.edges.iter().map(|e| e.at_height(0.0)))
            .collect();
        let top: Vec<EdgeSnapshot> = loops
            .iter()
            .flat_map(|l| l.edges.iter().map(|e| e.at_height(self.length)))
            .collect();
        faces.push(FaceSnapshot::planar(face_id(), -DVec3::Z, bottom));
        faces.push(FaceSnapshot::planar(face_id(), DVec3::Z, top));

        // Side walls
        for profile_loop in &loops {
            for edge in &profile_loop.edges {
                let lower = edge.at_height(0.0);
                let upper = edge.at_height(self.length).reversed();
                let edges = vec![
                    lower,
                    EdgeSnapshot::line(lower.end, upper.start),
                    upper,
                    EdgeSnapshot::line(upper.end, lower.start),
                ];
                let surface = match *edge {
                    ProfileEdge::Line { start, end } => {
                        let d = end - start;
                        FaceSurface::Planar {
                            normal: DVec3::new(d.y, -d.x, 0.0).normalize(),
                        }
                    }
                    ProfileEdge::Arc { start, center, .. } => FaceSurface::Cylindrical {
                        origin: DVec3::new(center.x, center.y, 0.0),
                        axis: DVec3::Z,
                        radius: (start - center).length(),
                    },
                };
                faces.push(FaceSnapshot {
                    id: face_id(),
                    surface,
                    edges,
                });
            }
        }

        BrepSnapshot::new(self.solid_id, self.name.clone(), faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_face_count() {
        let block = SnapshotBuilder::rectangular_block(10.0, 10.0, 2.0).extrude();
        assert_eq!(block.face_count(), 6); // 2 caps + 4 walls
        assert!(block.faces.iter().all(|f| f.is_planar()));
        assert!(block.check().is_ok());
    }

    #[test]
    fn test_block_bounds() {
        let block = SnapshotBuilder::rectangular_block(4.0, 3.0, 2.0).extrude();
        let bounds = block.bounds().unwrap();
        assert_eq!(bounds.min, DVec3::ZERO);
        assert_eq!(bounds.max, DVec3::new(4.0, 3.0, 2.0));
    }

    #[test]
    fn test_clockwise_outline_is_reoriented() {
        let cw = [
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 0.0),
        ];
        let snapshot = SnapshotBuilder::new("cw", ProfileLoop::polygon(&cw)).extrude();
        // The wall on x = 0 must face -X after reorientation
        let faces_minus_x = snapshot
            .faces
            .iter()
            .filter(|f| f.normal().is_some_and(|n| n.x < -0.99))
            .count();
        assert_eq!(faces_minus_x, 1);
    }

    #[test]
    fn test_gallery_adds_cylindrical_walls() {
        let dims = MonolithDimensions {
            base_width: 16.0,
            crest_width: 4.0,
            height: 20.0,
            upstream_run: 0.0,
        };
        let snapshot =
            SnapshotBuilder::galleried_monolith(dims, 5.0, DVec2::new(5.0, 4.0), 1.0).extrude();
        assert_eq!(snapshot.name, "galleried monolith");

        let cylinders = snapshot
            .faces
            .iter()
            .filter(|f| matches!(f.surface, FaceSurface::Cylindrical { .. }))
            .count();
        assert_eq!(cylinders, 2);
        assert_eq!(snapshot.face_count(), 2 + 4 + 2);
    }

    #[test]
    fn test_circle_loop_orientation() {
        let circle = ProfileLoop::circle(DVec2::ZERO, 2.0);
        assert!(circle.signed_area() > 0.0);
        assert!(circle.oriented(false).signed_area() < 0.0);
    }

    #[test]
    fn test_full_circle_hole_is_one_seamed_face() {
        let snapshot = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0)
            .with_hole(ProfileLoop::full_circle(DVec2::new(5.0, 5.0), 1.0))
            .extrude();
        assert_eq!(snapshot.face_count(), 2 + 4 + 1);

        let cylinder = snapshot
            .faces
            .iter()
            .find(|f| matches!(f.surface, FaceSurface::Cylindrical { .. }))
            .unwrap();
        // Both seam lines run between the same two points
        let seam_up = &cylinder.edges[1];
        let seam_down = &cylinder.edges[3];
        assert_eq!(seam_up.start, seam_down.end);
        assert_eq!(seam_up.end, seam_down.start);
        assert_eq!(cylinder.edges[0].start, cylinder.edges[0].end);
    }
}
