//! Narrow-phase collision detection
//!
//! Pure geometry: every detector is a free function over world-space
//! positions, radii and vertex rings, so the tests never need a world.
//! Detectors report a [`Contact`] whose normal points from the *first*
//! shape toward the *second*, with the penetration depth along it; `None`
//! means separated. Degenerate configurations (coincident centers,
//! zero-length edges) fall back to a fixed axis instead of dividing by
//! zero.

use glam::DVec2;

use super::shape::centroid;
use super::transform::Transform;
use crate::{perp, rotate_point};

/// Geometry epsilon for the degenerate-case fallbacks.
const EPS: f64 = 1e-3;

/// Result of a positive narrow-phase test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first shape toward the second
    pub normal: DVec2,
    /// Overlap depth along the normal, >= 0
    pub penetration: f64,
}

impl Contact {
    /// The same contact seen from the other body.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            penetration: self.penetration,
        }
    }
}

/// Circle vs circle. Colliding iff the squared center distance is below the
/// squared radius sum; coincident centers fall back to a `(1, 0)` normal.
pub fn circle_circle(center1: DVec2, r1: f64, center2: DVec2, r2: f64) -> Option<Contact> {
    let delta = center2 - center1;
    let radius_sum = r1 + r2;
    if delta.length_squared() >= radius_sum * radius_sum {
        return None;
    }
    let distance = delta.length();
    let normal = if distance > EPS {
        delta / distance
    } else {
        DVec2::X
    };
    Some(Contact {
        normal,
        penetration: radius_sum - distance,
    })
}

/// Axis-aligned AABB overlap test (legacy boolean path, ignores rotation).
/// `min`/`max` are local offsets from each position.
pub fn aabb_overlap(
    pos1: DVec2,
    min1: DVec2,
    max1: DVec2,
    pos2: DVec2,
    min2: DVec2,
    max2: DVec2,
) -> bool {
    let (lo1, hi1) = (pos1 + min1, pos1 + max1);
    let (lo2, hi2) = (pos2 + min2, pos2 + max2);
    if hi1.x < lo2.x || lo1.x > hi2.x {
        return false;
    }
    if hi1.y < lo2.y || lo1.y > hi2.y {
        return false;
    }
    true
}

/// Projection interval of a vertex ring onto a unit axis.
fn project(vertices: &[DVec2], axis: DVec2) -> (f64, f64) {
    let mut min = axis.dot(vertices[0]);
    let mut max = min;
    for &v in &vertices[1..] {
        let d = axis.dot(v);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// Edge perpendiculars of a ring, skipping degenerate edges. Orientation
/// follows the winding; SAT treats each axis as an unoriented line.
fn edge_normals(vertices: &[DVec2], axes: &mut Vec<DVec2>) {
    for i in 0..vertices.len() {
        let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
        let len = edge.length();
        if len > EPS {
            axes.push(perp(edge) / len);
        }
    }
}

/// Separating Axis Theorem over two convex world-space vertex rings.
///
/// Tests the edge normals of both rings; any axis with a projection gap
/// proves separation (early out). Otherwise the axis of minimum overlap is
/// the contact normal, oriented from `first` toward `second` via the ring
/// centroids, and its overlap is the penetration depth.
pub fn sat_polygons(first: &[DVec2], second: &[DVec2]) -> Option<Contact> {
    if first.len() < 3 || second.len() < 3 {
        return None;
    }

    let mut axes = Vec::with_capacity(first.len() + second.len());
    edge_normals(first, &mut axes);
    edge_normals(second, &mut axes);

    let mut min_overlap = f64::INFINITY;
    let mut best_axis = DVec2::X;
    for axis in axes {
        let (min1, max1) = project(first, axis);
        let (min2, max2) = project(second, axis);
        if max1 < min2 || max2 < min1 {
            return None;
        }
        let overlap = (max1 - min2).min(max2 - min1);
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = axis;
        }
    }

    // Edge normals carry the winding's orientation; re-point the axis from
    // the first ring toward the second so impulse signs come out right.
    let delta = centroid(second) - centroid(first);
    let normal = if best_axis.dot(delta) < 0.0 {
        -best_axis
    } else {
        best_axis
    };
    Some(Contact {
        normal,
        penetration: min_overlap,
    })
}

/// Convex polygon vs circle via the closest point on the polygon boundary.
///
/// Walks every edge, projects the circle center onto the segment (clamped
/// to its endpoints) and keeps the nearest point. The normal points from
/// the polygon toward the circle; a center sitting on the boundary falls
/// back to `(1, 0)` before the orientation flip.
pub fn polygon_circle(polygon: &[DVec2], circle_center: DVec2, radius: f64) -> Option<Contact> {
    if polygon.len() < 3 {
        return None;
    }

    let mut closest = polygon[0];
    let mut best_dist_sq = f64::INFINITY;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let edge = b - a;
        let len_sq = edge.length_squared();
        let point = if len_sq > EPS * EPS {
            let t = ((circle_center - a).dot(edge) / len_sq).clamp(0.0, 1.0);
            a + edge * t
        } else {
            a
        };
        let dist_sq = (circle_center - point).length_squared();
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            closest = point;
        }
    }

    let distance = best_dist_sq.sqrt();
    if distance > radius {
        return None;
    }

    let mut normal = if distance > EPS {
        (circle_center - closest) / distance
    } else {
        DVec2::X
    };
    // A center inside the polygon yields an inward-facing normal; flip it
    // to point from the polygon toward the circle.
    if normal.dot(circle_center - centroid(polygon)) < 0.0 {
        normal = -normal;
    }
    Some(Contact {
        normal,
        penetration: radius - distance,
    })
}

/// Circle vs rotated box via a local-frame clamp.
///
/// Brings the circle center into the box's unrotated frame, clamps it to
/// the box extents for the closest point, then rotates the normal back to
/// world space. Normal points from the box toward the circle. A center
/// fully inside the box picks the nearest face instead.
pub fn circle_rotated_aabb(
    circle_center: DVec2,
    radius: f64,
    box_transform: &Transform,
    min: DVec2,
    max: DVec2,
) -> Option<Contact> {
    let local = rotate_point(circle_center - box_transform.position, -box_transform.rotation);
    let box_center = (min + max) * 0.5;
    let half = (max - min) * 0.5;
    let closest = local.clamp(box_center - half, box_center + half);

    let delta = local - closest;
    let dist_sq = delta.length_squared();
    if dist_sq > radius * radius {
        return None;
    }

    let (local_normal, penetration) = if dist_sq > EPS * EPS {
        let distance = dist_sq.sqrt();
        (delta / distance, radius - distance)
    } else {
        // Center inside the box: push out through the nearest face
        let offset = local - box_center;
        let local_normal = if offset.x.abs() > offset.y.abs() {
            DVec2::new(offset.x.signum(), 0.0)
        } else {
            DVec2::new(0.0, offset.y.signum())
        };
        (local_normal, radius)
    };

    Some(Contact {
        normal: rotate_point(local_normal, box_transform.rotation),
        penetration,
    })
}

/// Point containment for a circle body, used by pickers.
pub fn point_in_circle(point: DVec2, center: DVec2, radius: f64) -> bool {
    (point - center).length_squared() < radius * radius
}
