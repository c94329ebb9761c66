//! Simulation module
//!
//! All physics state and logic lives here. This module must stay pure and
//! deterministic:
//! - Externally supplied delta time only, no clocks
//! - Stable iteration order (by body slot index)
//! - No rendering or platform dependencies
//! - Errors recover locally (no-op + log), never abort a step

pub mod body;
pub mod collision;
pub mod resolver;
pub mod shape;
pub mod transform;
pub mod world;

pub use body::{Body, Material, RigidBody};
pub use collision::{
    Contact, aabb_overlap, circle_circle, circle_rotated_aabb, point_in_circle, polygon_circle,
    sat_polygons,
};
pub use shape::{Shape, centroid, rectangle, regular_polygon};
pub use transform::{Transform, TransformId, Transforms};
pub use world::{BodyId, World};
