//! Rigid-body attributes, surface materials, and the body aggregate

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::shape::Shape;
use super::transform::TransformId;

/// Surface response properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Mass per unit area, consumed by [`RigidBody::from_shape`]
    pub density: f64,
    /// Post/pre collision relative normal speed ratio, conventionally 0..=1
    pub restitution: f64,
    /// Coulomb friction while at rest along the contact tangent
    pub static_friction: f64,
    /// Coulomb friction while sliding
    pub dynamic_friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 0.5,
            static_friction: 0.4,
            dynamic_friction: 0.3,
        }
    }
}

/// Dynamic state of one body.
///
/// Invariant: `inv_mass == 1/mass` when `mass > 0`, else 0; same for
/// inertia. Static bodies have both inverses zero. The constructors
/// maintain this; mutate mass only by replacing the whole value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub mass: f64,
    pub inv_mass: f64,
    pub inertia: f64,
    pub inv_inertia: f64,
    /// Linear velocity, world units per second
    pub velocity: DVec2,
    /// Angular velocity, radians per second (counter-clockwise positive)
    pub angular_velocity: f64,
    /// Force accumulator, cleared each step by the integrator
    pub force: DVec2,
    /// Torque accumulator, cleared each step by the integrator
    pub torque: f64,
}

impl RigidBody {
    /// Dynamic body with explicit mass and inertia. Non-positive values
    /// yield a zero inverse (that axis becomes unmovable).
    pub fn new(mass: f64, inertia: f64) -> Self {
        Self {
            mass,
            inv_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inertia,
            inv_inertia: if inertia > 0.0 { 1.0 / inertia } else { 0.0 },
            velocity: DVec2::ZERO,
            angular_velocity: 0.0,
            force: DVec2::ZERO,
            torque: 0.0,
        }
    }

    /// Static (infinite-mass) body: never moved by impulses or correction.
    pub fn fixed() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Dynamic body with mass/inertia derived from shape area and material
    /// density.
    pub fn from_shape(shape: &Shape, density: f64) -> Self {
        let (mass, inertia) = shape.mass_properties(density);
        Self::new(mass, inertia)
    }

    /// True when this body is unaffected by dynamics.
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == 0.0
    }

    /// Instantaneous momentum change: `velocity += impulse / mass`.
    pub fn apply_impulse(&mut self, impulse: DVec2) {
        self.velocity += impulse * self.inv_mass;
    }

    /// Accumulate a force for the next integration step.
    pub fn add_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Accumulate a torque for the next integration step.
    pub fn add_torque(&mut self, torque: f64) {
        self.torque += torque;
    }
}

/// One simulated entity: a transform handle plus optional physics parts.
///
/// The optional parts back the missing-component error taxonomy: any
/// operation needing a part the body lacks silently skips the body instead
/// of failing the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub(crate) transform: TransformId,
    pub shape: Option<Shape>,
    pub rigid: Option<RigidBody>,
    pub material: Option<Material>,
}

impl Body {
    /// Bare body: transform only.
    pub fn new(transform: TransformId) -> Self {
        Self {
            transform,
            shape: None,
            rigid: None,
            material: None,
        }
    }

    /// Handle of the owned transform.
    pub fn transform_id(&self) -> TransformId {
        self.transform
    }
}
