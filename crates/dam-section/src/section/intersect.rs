//! Plane / B-rep intersection
//!
//! Produces the raw, unordered 3D segments where a cutting plane meets the
//! faces of a snapshot.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{ExtractionOptions, ExtractionResult, GeometryExtractionError};
use crate::constants::INTERSECTION_TOLERANCE;
use crate::diagnostics::DiagnosticSink;
use crate::geometry::{ArcDescriptor, Plane};
use crate::kernel::{BrepSnapshot, EdgeSnapshot, FaceId, FaceSnapshot, FaceSurface};

/// A raw intersection segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    /// Start point
    pub start: DVec3,
    /// End point
    pub end: DVec3,
    /// Arc metadata for curved segments
    pub arc: Option<ArcDescriptor>,
    /// Face the segment was cut from
    pub face: FaceId,
}

impl CurveSegment {
    /// Straight segment
    pub fn line(start: DVec3, end: DVec3, face: FaceId) -> Self {
        Self {
            start,
            end,
            arc: None,
            face,
        }
    }

    /// Segment copied from a face edge
    pub fn from_edge(edge: &EdgeSnapshot, face: FaceId) -> Self {
        Self {
            start: edge.start,
            end: edge.end,
            arc: edge.arc,
            face,
        }
    }

    /// Check if this segment is a circular arc
    pub fn is_arc(&self) -> bool {
        self.arc.is_some()
    }

    /// Point halfway along the segment
    pub fn midpoint(&self) -> DVec3 {
        match &self.arc {
            Some(arc) => arc.midpoint(self.start, self.end),
            None => (self.start + self.end) * 0.5,
        }
    }

    /// Polyline through the segment; arcs are split into `arc_chords` chords
    pub fn polyline(&self, arc_chords: u32) -> Vec<DVec3> {
        match &self.arc {
            Some(arc) => arc.sample(self.start, self.end, arc_chords),
            None => vec![self.start, self.end],
        }
    }

    /// Check if the segment has no extent (full-circle arcs do)
    fn is_degenerate(&self, tolerance: f64) -> bool {
        self.arc.is_none() && self.start.distance(self.end) < tolerance
    }

    /// Same curve, in either direction
    fn coincides_with(&self, other: &CurveSegment, tolerance: f64) -> bool {
        let same_ends = (self.start.distance(other.start) < tolerance
            && self.end.distance(other.end) < tolerance)
            || (self.start.distance(other.end) < tolerance
                && self.end.distance(other.start) < tolerance);
        same_ends && self.midpoint().distance(other.midpoint()) < tolerance
    }
}

/// Computes plane / face intersections
#[derive(Debug, Clone, Copy)]
pub struct SectionPlaneIntersector {
    tolerance: f64,
    arc_samples: u32,
}

impl Default for SectionPlaneIntersector {
    fn default() -> Self {
        Self::new(&ExtractionOptions::default())
    }
}

impl SectionPlaneIntersector {
    /// Create an intersector from extraction options
    pub fn new(options: &ExtractionOptions) -> Self {
        Self {
            tolerance: options.intersection_tolerance,
            arc_samples: options.arc_samples.max(1),
        }
    }

    /// Intersect every face of the snapshot with the plane.
    ///
    /// Returns `NoIntersection` when the plane misses the solid instead of an
    /// empty list.
    pub fn intersect(
        &self,
        snapshot: &BrepSnapshot,
        plane: &Plane,
        sink: &dyn DiagnosticSink,
    ) -> ExtractionResult<Vec<CurveSegment>> {
        if !plane.is_orthonormal(INTERSECTION_TOLERANCE.max(self.tolerance)) {
            return Err(GeometryExtractionError::InvalidPlane(format!(
                "normal {:?}, basis {:?} / {:?} is not orthonormal",
                plane.normal, plane.u_axis, plane.v_axis
            )));
        }

        let Some(bounds) = snapshot.bounds() else {
            return Err(GeometryExtractionError::NoIntersection);
        };
        let distances = bounds.corners().map(|c| plane.signed_distance(c));
        if distances.iter().all(|d| *d > self.tolerance)
            || distances.iter().all(|d| *d < -self.tolerance)
        {
            return Err(GeometryExtractionError::NoIntersection);
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        for face in &snapshot.faces {
            let coplanar = self.is_coplanar(face, plane);
            for segment in self.intersect_face(face, plane, sink) {
                if segment.is_degenerate(self.tolerance) {
                    continue;
                }
                match candidates
                    .iter_mut()
                    .find(|c| c.segment.coincides_with(&segment, self.tolerance))
                {
                    Some(candidate) => {
                        candidate.faces += 1;
                        candidate.coplanar |= coplanar;
                    }
                    None => candidates.push(Candidate {
                        segment,
                        faces: 1,
                        coplanar,
                    }),
                }
            }
        }

        // An on-plane edge cut from two faces on the same side of the plane is
        // where the solid only touches the plane
        let touching = candidates
            .iter()
            .filter(|c| !c.coplanar && c.faces > 1)
            .count();
        if touching > 0 {
            sink.debug(
                "intersect",
                &format!("'{}': dropping {} touching edge(s)", snapshot.name, touching),
            );
        }
        let segments: Vec<CurveSegment> = candidates
            .into_iter()
            .filter(|c| c.coplanar || c.faces == 1)
            .map(|c| c.segment)
            .collect();

        if segments.is_empty() {
            return Err(GeometryExtractionError::NoIntersection);
        }

        sink.debug(
            "intersect",
            &format!(
                "'{}': {} segment(s) from {} face(s)",
                snapshot.name,
                segments.len(),
                snapshot.face_count()
            ),
        );
        Ok(segments)
    }

    fn is_coplanar(&self, face: &FaceSnapshot, plane: &Plane) -> bool {
        face.normal()
            .is_some_and(|normal| plane.is_parallel_normal(normal, self.tolerance))
            && face
                .edges
                .iter()
                .all(|e| plane.signed_distance(e.start).abs() < self.tolerance)
    }

    /// Intersect a single face with the plane.
    ///
    /// Vertices within tolerance of the plane count as lying on its positive
    /// side, so every boundary ring changes side an even number of times and a
    /// vertex that only touches the plane adds no crossing.
    pub fn intersect_face(
        &self,
        face: &FaceSnapshot,
        plane: &Plane,
        sink: &dyn DiagnosticSink,
    ) -> Vec<CurveSegment> {
        let tol = self.tolerance;

        // Coplanar face: its boundary is the section
        if let Some(normal) = face.normal()
            && plane.is_parallel_normal(normal, tol)
        {
            if self.is_coplanar(face, plane) {
                return face
                    .edges
                    .iter()
                    .flat_map(|e| split_full_circle(CurveSegment::from_edge(e, face.id), tol))
                    .collect();
            }
            return Vec::new();
        }

        let mut crossings: Vec<DVec3> = Vec::new();
        for ring in boundary_rings(face, self.arc_samples, tol) {
            ring_crossings(&ring, plane, tol, &mut crossings);
        }
        if crossings.is_empty() {
            return Vec::new();
        }

        match face.surface {
            FaceSurface::Planar { normal } => {
                // Order along the cut line so spans pair up on non-convex faces
                let direction = normal.cross(plane.normal);
                crossings.sort_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)));
                crossings
                    .chunks_exact(2)
                    .map(|pair| CurveSegment::line(pair[0], pair[1], face.id))
                    .collect()
            }
            FaceSurface::Cylindrical { origin, axis, radius }
                if crossings.len() == 2 && plane.is_parallel_normal(axis, tol) =>
            {
                let (p, q) = (crossings[0], crossings[1]);
                if p.distance(q) < tol {
                    // Both sides of a seam: the face wraps all the way round
                    let axis = face
                        .edges
                        .iter()
                        .find_map(|e| e.arc.map(|arc| arc.axis))
                        .unwrap_or(axis);
                    let center = origin + axis * axis.dot(p - origin);
                    let full = CurveSegment {
                        start: p,
                        end: p,
                        arc: Some(ArcDescriptor::new(center, radius, axis)),
                        face: face.id,
                    };
                    split_full_circle(full, tol)
                } else {
                    vec![self.cylinder_arc(face, origin, axis, radius, p, q)]
                }
            }
            _ => {
                let segments: Vec<CurveSegment> = crossings
                    .chunks_exact(2)
                    .map(|pair| CurveSegment::line(pair[0], pair[1], face.id))
                    .collect();
                if segments.iter().any(|s| s.is_degenerate(tol)) {
                    sink.warn(
                        "intersect",
                        &format!(
                            "face {}: cut closes on itself across a seam and cannot be resolved",
                            face.id.index
                        ),
                    );
                }
                segments
            }
        }
    }

    /// Arc where a plane perpendicular to a cylinder's axis cuts the face.
    ///
    /// The sweep direction follows the face's own arc edges; without one the
    /// cut falls back to a chord.
    fn cylinder_arc(
        &self,
        face: &FaceSnapshot,
        origin: DVec3,
        axis: DVec3,
        radius: f64,
        p: DVec3,
        q: DVec3,
    ) -> CurveSegment {
        let Some((edge, edge_arc)) = face
            .edges
            .iter()
            .find_map(|e| e.arc.map(|arc| (e, arc)))
        else {
            return CurveSegment::line(p, q, face.id);
        };

        let axis = axis.normalize();
        let center = origin + axis * axis.dot(p - origin);
        let arc = ArcDescriptor::new(center, radius, edge_arc.axis);

        // Bring the face's arc midpoint to the cutting level
        let reference = edge_arc.midpoint(edge.start, edge.end);
        let reference = reference + axis * axis.dot(p - reference);

        let sweep_to_q = arc.sweep_angle(p, q);
        let sweep_to_reference = arc.sweep_angle(p, reference);
        let (start, end) = if sweep_to_reference < sweep_to_q {
            (p, q)
        } else {
            (q, p)
        };

        CurveSegment {
            start,
            end,
            arc: Some(arc),
            face: face.id,
        }
    }
}

/// Merged intersection segment with the faces that produced it
struct Candidate {
    segment: CurveSegment,
    faces: u32,
    coplanar: bool,
}

/// Split a full-circle arc into two half arcs at its start and the opposite
/// point; other segments pass through unchanged
fn split_full_circle(segment: CurveSegment, tolerance: f64) -> Vec<CurveSegment> {
    match segment.arc {
        Some(arc) if segment.start.distance(segment.end) < tolerance => {
            let opposite = arc.center * 2.0 - segment.start;
            vec![
                CurveSegment {
                    end: opposite,
                    ..segment
                },
                CurveSegment {
                    start: opposite,
                    ..segment
                },
            ]
        }
        _ => vec![segment],
    }
}

/// Closed point rings of a face boundary.
///
/// Consecutive edges stay in one ring while each starts where the previous
/// one ended; the repeated closing point is dropped.
fn boundary_rings(face: &FaceSnapshot, arc_chords: u32, tolerance: f64) -> Vec<Vec<DVec3>> {
    let mut rings: Vec<Vec<DVec3>> = Vec::new();
    let mut current: Vec<DVec3> = Vec::new();
    for edge in &face.edges {
        let points = edge.polyline(arc_chords);
        let continues = current
            .last()
            .is_some_and(|last| last.distance(edge.start) < tolerance);
        if continues {
            current.extend(points.into_iter().skip(1));
        } else if current.is_empty() {
            current = points;
        } else {
            rings.push(std::mem::replace(&mut current, points));
        }
    }
    if !current.is_empty() {
        rings.push(current);
    }
    for ring in &mut rings {
        if ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) < tolerance {
            ring.pop();
        }
    }
    rings
}

/// Points where a closed ring changes side of the plane, on-plane vertices
/// counting as positive
fn ring_crossings(ring: &[DVec3], plane: &Plane, tolerance: f64, crossings: &mut Vec<DVec3>) {
    let n = ring.len();
    if n < 2 {
        return;
    }
    let distances: Vec<f64> = ring.iter().map(|p| plane.signed_distance(*p)).collect();
    let above = |d: f64| d > -tolerance;
    for i in 0..n {
        let j = (i + 1) % n;
        let (da, db) = (distances[i], distances[j]);
        if above(da) == above(db) {
            continue;
        }
        crossings.push(if da.abs() < tolerance {
            ring[i]
        } else if db.abs() < tolerance {
            ring[j]
        } else {
            ring[i] + (ring[j] - ring[i]) * (da / (da - db))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::kernel::{ProfileLoop, SnapshotBuilder};
    use approx::assert_abs_diff_eq;
    use glam::DVec2;
    use uuid::Uuid;

    fn intersector() -> SectionPlaneIntersector {
        SectionPlaneIntersector::default()
    }

    #[test]
    fn test_block_mid_cut_gives_four_segments() {
        let block = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0).extrude();
        let segments = intersector()
            .intersect(&block, &Plane::xy_at(2.0), &NullSink)
            .unwrap();
        assert_eq!(segments.len(), 4);
        let total: f64 = segments.iter().map(|s| s.start.distance(s.end)).sum();
        assert_abs_diff_eq!(total, 40.0, epsilon = 1e-9);
        assert!(segments.iter().all(|s| (s.start.z - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_cut_through_cap_deduplicates_wall_edges() {
        let block = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0).extrude();
        let segments = intersector()
            .intersect(&block, &Plane::xy_at(4.0), &NullSink)
            .unwrap();
        assert_eq!(segments.len(), 4, "cap edges and wall edges should merge");
    }

    #[test]
    fn test_plane_outside_bounds() {
        let block = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0).extrude();
        let result = intersector().intersect(&block, &Plane::xy_at(-1.0), &NullSink);
        assert_eq!(result, Err(GeometryExtractionError::NoIntersection));
    }

    #[test]
    fn test_non_convex_face_pairs_along_cut_line() {
        // U-shaped planar face in the XZ plane, cut by z = 1 through both prongs
        let id = FaceId::new(Uuid::nil(), 0);
        let pts = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 2.0),
            DVec3::new(2.0, 0.0, 2.0),
            DVec3::new(2.0, 0.0, 0.5),
            DVec3::new(1.0, 0.0, 0.5),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(0.0, 0.0, 2.0),
        ];
        let edges = (0..pts.len())
            .map(|i| EdgeSnapshot::line(pts[i], pts[(i + 1) % pts.len()]))
            .collect();
        let face = FaceSnapshot::planar(id, -DVec3::Y, edges);

        let segments = intersector().intersect_face(&face, &Plane::xy_at(1.0), &NullSink);
        assert_eq!(segments.len(), 2);
        for s in &segments {
            assert_abs_diff_eq!(s.start.distance(s.end), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_touching_vertex_adds_no_crossing() {
        // Triangle in the XZ plane whose apex just reaches z = 2
        let id = FaceId::new(Uuid::nil(), 0);
        let pts = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 2.0),
        ];
        let edges = (0..3)
            .map(|i| EdgeSnapshot::line(pts[i], pts[(i + 1) % 3]))
            .collect();
        let face = FaceSnapshot::planar(id, -DVec3::Y, edges);

        let segments = intersector().intersect_face(&face, &Plane::xy_at(2.0), &NullSink);
        assert!(segments.iter().all(|s| s.start.distance(s.end) < 1e-12));

        let flipped = Plane::new(DVec3::new(0.0, 0.0, 2.0), -DVec3::Z, DVec3::X);
        assert!(intersector().intersect_face(&face, &flipped, &NullSink).is_empty());
    }

    #[test]
    fn test_edge_between_two_cut_faces_is_dropped() {
        // Notch tip at (2, 1) lies on the plane; both notch walls reach it
        let outline = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 2.0),
            DVec2::new(3.0, 2.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        let snapshot = SnapshotBuilder::new("v-notch", ProfileLoop::polygon(&outline))
            .with_length(3.0)
            .extrude();
        let plane = Plane::new(DVec3::new(0.0, 1.0, 0.0), -DVec3::Y, DVec3::X);
        let segments = intersector().intersect(&snapshot, &plane, &NullSink).unwrap();

        // Two spans per cap meeting at the tip, plus the two end walls
        assert_eq!(segments.len(), 6);
        let along_tip = segments
            .iter()
            .filter(|s| (s.start.x - 2.0).abs() < 1e-9 && (s.end.x - 2.0).abs() < 1e-9)
            .count();
        assert_eq!(along_tip, 0);
    }

    #[test]
    fn test_seamed_cylinder_yields_full_circle() {
        let snapshot = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0)
            .with_hole(ProfileLoop::full_circle(DVec2::new(5.0, 5.0), 1.0))
            .extrude();
        let cylinder = snapshot
            .faces
            .iter()
            .find(|f| matches!(f.surface, FaceSurface::Cylindrical { .. }))
            .unwrap();

        let arcs = intersector().intersect_face(cylinder, &Plane::xy_at(2.0), &NullSink);
        assert_eq!(arcs.len(), 2);
        let mut sweep = 0.0;
        for arc in &arcs {
            let descriptor = arc.arc.unwrap();
            assert!(descriptor.center.distance(DVec3::new(5.0, 5.0, 2.0)) < 1e-12);
            sweep += descriptor.sweep_angle(arc.start, arc.end);
        }
        assert_abs_diff_eq!(sweep, std::f64::consts::TAU, epsilon = 1e-9);
        assert!(arcs[0].end.distance(arcs[1].start) < 1e-12);
        assert!(arcs[1].end.distance(arcs[0].start) < 1e-12);
    }

    #[test]
    fn test_cylindrical_wall_yields_arc() {
        let snapshot = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0)
            .with_hole(ProfileLoop::circle(DVec2::new(5.0, 5.0), 1.5))
            .extrude();
        let segments = intersector()
            .intersect(&snapshot, &Plane::xy_at(1.0), &NullSink)
            .unwrap();
        let arcs: Vec<&CurveSegment> = segments.iter().filter(|s| s.is_arc()).collect();
        assert_eq!(arcs.len(), 2);
        for arc in arcs {
            let descriptor = arc.arc.unwrap();
            assert_abs_diff_eq!(descriptor.radius, 1.5);
            assert_abs_diff_eq!(descriptor.center.z, 1.0, epsilon = 1e-12);
            // Each half of the gallery spans half a turn
            let sweep = descriptor.sweep_angle(arc.start, arc.end);
            assert_abs_diff_eq!(sweep, std::f64::consts::PI, epsilon = 1e-9);
        }
    }
}
