//! Shape descriptors and world-space geometry
//!
//! A shape is local-space geometry; combined with a [`Transform`] it yields
//! the world-space corners/vertices the narrow phase and renderers consume.
//! Collider geometry follows position and rotation only; transform scale is
//! a visual property and does not resize colliders.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::transform::Transform;
use crate::rotate_point;

/// Collider geometry, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle of `radius` around the transform position
    Circle { radius: f64 },
    /// Box spanning `min..max` as local offsets from the transform position
    Aabb { min: DVec2, max: DVec2 },
    /// Convex ring of local-space vertices, consistent winding
    Polygon { vertices: Vec<DVec2> },
}

impl Shape {
    /// Circle collider. A non-positive radius is sanitized to a tiny
    /// positive one (logged) rather than poisoning later math.
    pub fn circle(radius: f64) -> Self {
        let radius = if radius > 0.0 {
            radius
        } else {
            log::warn!("circle: non-positive radius {radius}, sanitized");
            radius.abs().max(1e-9)
        };
        Self::Circle { radius }
    }

    /// Box collider from local min/max offsets. Swapped components are
    /// sorted (logged) so `min < max` holds per axis.
    pub fn aabb(min: DVec2, max: DVec2) -> Self {
        if min.x >= max.x || min.y >= max.y {
            log::warn!("aabb: degenerate bounds min={min:?} max={max:?}, sorted");
            return Self::Aabb {
                min: min.min(max),
                max: min.max(max),
            };
        }
        Self::Aabb { min, max }
    }

    /// Convex polygon collider. Returns `None` for fewer than 3 vertices.
    pub fn polygon(vertices: Vec<DVec2>) -> Option<Self> {
        if vertices.len() < 3 {
            log::warn!("polygon: {} vertices, need at least 3", vertices.len());
            return None;
        }
        Some(Self::Polygon { vertices })
    }

    /// World-space vertex ring for boxes and polygons; `None` for circles.
    pub fn world_vertices(&self, transform: &Transform) -> Option<Vec<DVec2>> {
        match self {
            Shape::Circle { .. } => None,
            Shape::Aabb { min, max } => {
                Some(aabb_world_corners(transform, *min, *max).to_vec())
            }
            Shape::Polygon { vertices } => Some(
                vertices
                    .iter()
                    .map(|&v| transform.position + rotate_point(v, transform.rotation))
                    .collect(),
            ),
        }
    }

    /// Characteristic radius used by the stuck-pair metric: circle radius,
    /// mean half-extent for boxes, mean vertex distance from the centroid
    /// for polygons.
    pub(crate) fn extent_radius(&self) -> f64 {
        match self {
            Shape::Circle { radius } => *radius,
            Shape::Aabb { min, max } => {
                let half = (*max - *min) * 0.5;
                (half.x + half.y) * 0.5
            }
            Shape::Polygon { vertices } => {
                let center = centroid(vertices);
                let sum: f64 = vertices.iter().map(|&v| (v - center).length()).sum();
                sum / vertices.len() as f64
            }
        }
    }

    /// Mass and moment of inertia for this shape at the given material
    /// density: circle `I = mr²/2`, box `I = m(w² + h²)/12`, polygon via the
    /// convex second-moment sum about its centroid.
    pub fn mass_properties(&self, density: f64) -> (f64, f64) {
        match self {
            Shape::Circle { radius } => {
                let mass = density * std::f64::consts::PI * radius * radius;
                (mass, 0.5 * mass * radius * radius)
            }
            Shape::Aabb { min, max } => {
                let size = *max - *min;
                let mass = density * size.x * size.y;
                (mass, mass * (size.x * size.x + size.y * size.y) / 12.0)
            }
            Shape::Polygon { vertices } => polygon_mass_properties(vertices, density),
        }
    }
}

/// The four world-space corners of a (possibly rotated) box collider, in
/// ring order.
pub fn aabb_world_corners(transform: &Transform, min: DVec2, max: DVec2) -> [DVec2; 4] {
    let local = [
        DVec2::new(min.x, min.y),
        DVec2::new(max.x, min.y),
        DVec2::new(max.x, max.y),
        DVec2::new(min.x, max.y),
    ];
    local.map(|corner| transform.position + rotate_point(corner, transform.rotation))
}

/// Arithmetic mean of a vertex ring.
pub fn centroid(vertices: &[DVec2]) -> DVec2 {
    let sum: DVec2 = vertices.iter().copied().sum();
    sum / vertices.len() as f64
}

/// Vertex ring of a regular polygon with `sides` vertices on a circle of
/// `radius`, starting on the vertical axis.
pub fn regular_polygon(sides: usize, radius: f64) -> Vec<DVec2> {
    let step = std::f64::consts::TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * step;
            DVec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Vertex ring of an origin-centered rectangle.
pub fn rectangle(width: f64, height: f64) -> Vec<DVec2> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        DVec2::new(-hw, -hh),
        DVec2::new(hw, -hh),
        DVec2::new(hw, hh),
        DVec2::new(-hw, hh),
    ]
}

/// Mass and centroid-relative moment of inertia of a convex polygon with
/// uniform density, via the shoelace/second-moment sums.
fn polygon_mass_properties(vertices: &[DVec2], density: f64) -> (f64, f64) {
    let mut area2 = 0.0; // twice the signed area
    let mut second = 0.0; // Σ cross·(vi·vi + vi·vj + vj·vj)
    let mut center_acc = DVec2::ZERO;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let cross = crate::cross(a, b);
        area2 += cross;
        second += cross * (a.dot(a) + a.dot(b) + b.dot(b));
        center_acc += (a + b) * cross;
    }
    let area = (area2 / 2.0).abs();
    let mass = density * area;
    if area2.abs() < 1e-12 {
        log::warn!("polygon_mass_properties: degenerate polygon, zero area");
        return (0.0, 0.0);
    }
    let center = center_acc / (3.0 * area2);
    // Inertia about the origin, then shift to the centroid
    let inertia_origin = density * second.abs() / 12.0;
    let inertia = inertia_origin - mass * center.length_squared();
    (mass, inertia)
}
