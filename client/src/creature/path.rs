//! Arrival flight path.
//!
//! A centripetal Catmull-Rom spline through the start point and the end
//! points, sampled by arc length so that `point_at(u)` moves at constant
//! speed along the curve.

use bevy::math::{Affine3A, Vec3};

const ARC_LENGTH_DIVISIONS: usize = 200;
const TANGENT_DELTA: f32 = 1e-4;
const CENTRIPETAL_ALPHA: f32 = 0.25;
const MIN_KNOT_SPACING: f32 = 1e-4;

/// Where the arrival starts and ends.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPathSpec {
    /// Start point, in world space.
    pub start_world: Vec3,
    /// End points, in the creature's parent frame.
    pub end_points: Vec<Vec3>,
}

#[derive(Debug, Clone)]
pub struct FlightPath {
    points: Vec<Vec3>,
    arc_lengths: Vec<f32>,
}

impl FlightPath {
    /// Builds the path in the local space of `parent_world`.
    ///
    /// The end points' depth is mirrored when the parent frame's forward axis
    /// points towards +Z in world space, so the creature always comes in from
    /// behind the anchor whichever way the tracked object faces.
    pub fn build(spec: &FlightPathSpec, parent_world: &Affine3A) -> Self {
        let start = parent_world.inverse().transform_point3(spec.start_world);
        let depth_sign = if parent_world.transform_vector3(Vec3::Z).z > 0.0 {
            -1.0
        } else {
            1.0
        };

        let mut points = Vec::with_capacity(spec.end_points.len() + 1);
        points.push(start);
        points.extend(
            spec.end_points
                .iter()
                .map(|point| Vec3::new(point.x, point.y, point.z * depth_sign)),
        );

        Self::through(points)
    }

    /// Curve through `points`, already expressed in the frame it is sampled in.
    pub fn through(points: Vec<Vec3>) -> Self {
        let mut path = Self {
            points,
            arc_lengths: Vec::new(),
        };
        path.arc_lengths = path.compute_arc_lengths();
        path
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    pub fn end_point(&self) -> Vec3 {
        self.points.last().copied().unwrap_or(Vec3::ZERO)
    }

    /// Point at arc-length fraction `u` in `[0, 1]`.
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at arc-length fraction `u`. Zero for a degenerate path.
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        let t = self.u_to_t(u);
        let before = (t - TANGENT_DELTA).max(0.0);
        let after = (t + TANGENT_DELTA).min(1.0);
        (self.point(after) - self.point(before)).normalize_or_zero()
    }

    /// Point at curve parameter `t`, which is not proportional to distance.
    fn point(&self, t: f32) -> Vec3 {
        let points = &self.points;
        let count = points.len();
        match count {
            0 => return Vec3::ZERO,
            1 => return points[0],
            _ => {}
        }

        let scaled = (count - 1) as f32 * t.clamp(0.0, 1.0);
        let mut segment = scaled.floor() as usize;
        let mut weight = scaled - segment as f32;
        if segment >= count - 1 {
            segment = count - 2;
            weight = 1.0;
        }

        let p1 = points[segment];
        let p2 = points[segment + 1];
        let p0 = if segment > 0 {
            points[segment - 1]
        } else {
            2.0 * p1 - p2
        };
        let p3 = if segment + 2 < count {
            points[segment + 2]
        } else {
            2.0 * p2 - p1
        };

        let mut dt1 = p1.distance_squared(p2).powf(CENTRIPETAL_ALPHA);
        let mut dt0 = p0.distance_squared(p1).powf(CENTRIPETAL_ALPHA);
        let mut dt2 = p2.distance_squared(p3).powf(CENTRIPETAL_ALPHA);
        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
        let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;
        p1 + weight * (t1 + weight * (c2 + weight * c3))
    }

    fn compute_arc_lengths(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1);
        let mut previous = self.point(0.0);
        let mut total = 0.0;
        lengths.push(total);
        for step in 1..=ARC_LENGTH_DIVISIONS {
            let current = self.point(step as f32 / ARC_LENGTH_DIVISIONS as f32);
            total += current.distance(previous);
            lengths.push(total);
            previous = current;
        }
        lengths
    }

    fn u_to_t(&self, u: f32) -> f32 {
        let u = u.clamp(0.0, 1.0);
        let lengths = &self.arc_lengths;
        let last = lengths.len().saturating_sub(1);
        let total = self.length();
        if last == 0 || total <= 0.0 {
            return u;
        }

        let target = u * total;
        let index = lengths
            .partition_point(|&length| length <= target)
            .saturating_sub(1);
        if index >= last {
            return 1.0;
        }

        let before = lengths[index];
        let segment = lengths[index + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (index as f32 + fraction) / last as f32
    }
}
