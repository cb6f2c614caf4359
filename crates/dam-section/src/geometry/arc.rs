//! Circular arc descriptor and sampling

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Angles below this are treated as zero sweep (start and end coincide)
const MIN_SWEEP: f64 = 1e-9;

/// Circular arc metadata attached to an edge or segment.
///
/// The arc runs counter-clockwise about `axis` (right-hand rule) from the
/// owning edge's start point to its end point. Coincident start and end
/// points describe a full circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcDescriptor {
    /// Center of the circle
    pub center: DVec3,
    /// Radius of the circle
    pub radius: f64,
    /// Rotation axis (unit length)
    pub axis: DVec3,
}

impl ArcDescriptor {
    /// Create an arc descriptor, normalizing the axis
    pub fn new(center: DVec3, radius: f64, axis: DVec3) -> Self {
        Self {
            center,
            radius,
            axis: axis.normalize(),
        }
    }

    /// Same circle traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            axis: -self.axis,
            ..*self
        }
    }

    /// Sweep angle from `start` to `end`, in `(0, 2π]`
    pub fn sweep_angle(&self, start: DVec3, end: DVec3) -> f64 {
        let a = start - self.center;
        let b = end - self.center;
        let mut angle = self.axis.dot(a.cross(b)).atan2(a.dot(b));
        if angle <= MIN_SWEEP {
            angle += TAU;
        }
        angle
    }

    /// Sample the arc into `chords + 1` points; the first and last points are
    /// exactly `start` and `end`.
    pub fn sample(&self, start: DVec3, end: DVec3, chords: u32) -> Vec<DVec3> {
        let chords = chords.max(1);
        let sweep = self.sweep_angle(start, end);
        let radial = start - self.center;

        let mut points = Vec::with_capacity(chords as usize + 1);
        points.push(start);
        for i in 1..chords {
            let t = i as f64 / chords as f64;
            let rotation = DQuat::from_axis_angle(self.axis, sweep * t);
            points.push(self.center + rotation * radial);
        }
        points.push(end);
        points
    }

    /// Point halfway along the arc
    pub fn midpoint(&self, start: DVec3, end: DVec3) -> DVec3 {
        let sweep = self.sweep_angle(start, end);
        self.center + DQuat::from_axis_angle(self.axis, sweep * 0.5) * (start - self.center)
    }

    /// Translate the arc's center along its axis onto a plane through `point`
    /// whose normal is the arc axis.
    pub fn center_at_level_of(&self, point: DVec3) -> DVec3 {
        self.center + self.axis * self.axis.dot(point - self.center)
    }
}
