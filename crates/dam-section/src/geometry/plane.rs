//! Cutting plane with a local 2D frame

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// A cutting plane: origin, unit normal and two orthogonal in-plane basis vectors.
///
/// The basis defines the local 2D frame of every section cut with this plane:
/// a 3D point `p` maps to `((p - origin)·u_axis, (p - origin)·v_axis)`.
/// For dam sections `u_axis` points downstream and `v_axis` points up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Origin of the local frame
    pub origin: DVec3,
    /// Unit normal of the plane
    pub normal: DVec3,
    /// First in-plane basis vector (local X)
    pub u_axis: DVec3,
    /// Second in-plane basis vector (local Y)
    pub v_axis: DVec3,
}

impl Default for Plane {
    fn default() -> Self {
        Self::xy()
    }
}

impl Plane {
    /// Create a plane from an origin, a normal and the local X direction.
    ///
    /// The normal is normalized, `u_axis` is made orthogonal to it, and
    /// `v_axis = normal × u_axis` so the frame is right-handed.
    pub fn new(origin: DVec3, normal: DVec3, u_axis: DVec3) -> Self {
        let normal = normal.normalize();
        let u_axis = (u_axis - normal * u_axis.dot(normal)).normalize();
        let v_axis = normal.cross(u_axis);
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    /// Create a plane from an explicit basis without re-orthogonalizing it
    pub fn from_basis(origin: DVec3, normal: DVec3, u_axis: DVec3, v_axis: DVec3) -> Self {
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    /// XY plane at the world origin (local X = world X, local Y = world Y)
    pub fn xy() -> Self {
        Self::xy_at(0.0)
    }

    /// XY plane shifted to `z`; the usual cut across an extruded monolith
    pub fn xy_at(z: f64) -> Self {
        Self::from_basis(DVec3::new(0.0, 0.0, z), DVec3::Z, DVec3::X, DVec3::Y)
    }

    /// Check that the normal and basis are unit length and mutually orthogonal
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: DVec3| (v.length() - 1.0).abs() <= tolerance;
        unit(self.normal)
            && unit(self.u_axis)
            && unit(self.v_axis)
            && self.normal.dot(self.u_axis).abs() <= tolerance
            && self.normal.dot(self.v_axis).abs() <= tolerance
            && self.u_axis.dot(self.v_axis).abs() <= tolerance
    }

    /// Signed distance of a point from the plane (positive on the normal side)
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.normal)
    }

    /// Express a 3D point in the local 2D frame
    pub fn project(&self, point: DVec3) -> DVec2 {
        let d = point - self.origin;
        DVec2::new(d.dot(self.u_axis), d.dot(self.v_axis))
    }

    /// Map a local 2D point back onto the plane in world space
    pub fn lift(&self, point: DVec2) -> DVec3 {
        self.origin + self.u_axis * point.x + self.v_axis * point.y
    }

    /// Check whether a direction is parallel to the plane normal
    pub fn is_parallel_normal(&self, direction: DVec3, tolerance: f64) -> bool {
        1.0 - direction.normalize().dot(self.normal).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_builds_orthonormal_frame() {
        let plane = Plane::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0), DVec3::new(1.0, 0.0, 0.5));
        assert!(plane.is_orthonormal(1e-12));
        assert_abs_diff_eq!(plane.u_axis.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(plane.v_axis.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_and_lift() {
        let plane = Plane::xy_at(5.0);
        let p = DVec3::new(3.0, 4.0, 5.0);
        let local = plane.project(p);
        assert_eq!(local, DVec2::new(3.0, 4.0));
        assert_eq!(plane.lift(local), p);
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::xy_at(1.0);
        assert_abs_diff_eq!(plane.signed_distance(DVec3::new(0.0, 0.0, 3.0)), 2.0);
        assert_abs_diff_eq!(plane.signed_distance(DVec3::new(9.0, 9.0, 0.0)), -1.0);
    }

    #[test]
    fn test_skewed_basis_is_rejected() {
        let plane = Plane::from_basis(DVec3::ZERO, DVec3::Z, DVec3::X, DVec3::new(1.0, 1.0, 0.0));
        assert!(!plane.is_orthonormal(1e-6));
    }
}
