//! impulse2d - 2D rigid-body collision detection and impulse resolution
//!
//! Core modules:
//! - `sim`: the simulation world (transforms, shapes, bodies, narrow-phase
//!   detection, impulse resolution, integrators)
//! - `tuning`: data-driven stability knobs (clamps, thresholds, epsilons)
//!
//! The engine is single-threaded and frame-stepped: the embedding loop calls
//! [`sim::World::step`] once per tick with an externally chosen delta time.
//! Given a fixed spawn order the simulation is deterministic.

pub mod sim;
pub mod tuning;

pub use sim::{
    Body, BodyId, Contact, Material, RigidBody, Shape, Transform, TransformId, World,
};
pub use tuning::Tuning;

use glam::DVec2;

/// Z-component of the 2D cross product `a × b`.
#[inline]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Velocity of a point at offset `r` from a body spinning at `omega` rad/s:
/// `ω × r = (-ω·r.y, ω·r.x)`.
#[inline]
pub fn angular_point_velocity(omega: f64, r: DVec2) -> DVec2 {
    DVec2::new(-omega * r.y, omega * r.x)
}

/// Perpendicular vector, 90 degrees counter-clockwise: `(-y, x)`.
#[inline]
pub fn perp(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

/// Rotate `point` about the origin by `angle` radians (counter-clockwise).
#[inline]
pub fn rotate_point(point: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(point.x * cos - point.y * sin, point.x * sin + point.y * cos)
}

/// Rotate `point` about `center` by `angle` radians.
#[inline]
pub fn rotate_point_around(point: DVec2, center: DVec2, angle: f64) -> DVec2 {
    center + rotate_point(point - center, angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_cross_sign() {
        // x cross y is +1, y cross x is -1
        assert_abs_diff_eq!(cross(DVec2::X, DVec2::Y), 1.0);
        assert_abs_diff_eq!(cross(DVec2::Y, DVec2::X), -1.0);
    }

    #[test]
    fn test_angular_point_velocity_direction() {
        // Point to the right of a counter-clockwise spin moves up
        let v = angular_point_velocity(2.0, DVec2::new(3.0, 0.0));
        assert_abs_diff_eq!(v.x, 0.0);
        assert_abs_diff_eq!(v.y, 6.0);
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(DVec2::new(1.0, 0.0), FRAC_PI_2);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_point_around_center() {
        let p = rotate_point_around(DVec2::new(2.0, 1.0), DVec2::new(1.0, 1.0), FRAC_PI_2);
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
    }
}
