//! The simulation world
//!
//! Explicit context object owning every transform and body; all operations
//! take the world rather than reaching for globals. Bodies live in a slot
//! arena addressed by [`BodyId`]; iteration order is slot order, which makes
//! a run deterministic for a fixed spawn sequence.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, Material, RigidBody};
use super::resolver;
use super::shape::Shape;
use super::transform::{Transform, TransformId, Transforms};
use crate::tuning::Tuning;

/// Handle to a body slot in a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub(crate) u32);

/// Simulation context: transform arena, body arena, gravity and tuning.
///
/// Per step, [`step`](Self::step) integrates accumulated forces into
/// velocities, velocities into positions/rotations (dragging attached child
/// transforms), then runs the collision resolver. All state is mutated in
/// place; nothing outside the world may write body state during a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Resolver thresholds and clamps
    pub tuning: Tuning,
    /// Acceleration applied to every dynamic body, world units per second²
    pub gravity: DVec2,
    transforms: Transforms,
    slots: Vec<Option<Body>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Empty world with default tuning and no gravity.
    pub fn new() -> Self {
        Self {
            tuning: Tuning::default(),
            gravity: DVec2::ZERO,
            transforms: Transforms::default(),
            slots: Vec::new(),
        }
    }

    /// Empty world with explicit tuning.
    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            tuning,
            ..Self::new()
        }
    }

    // === Spawning and lookup ===

    /// Spawn a bare body (transform only). Reuses the first free slot.
    pub fn spawn(&mut self, transform: Transform) -> BodyId {
        let transform_id = self.transforms.insert(transform);
        let body = Body::new(transform_id);
        match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(body);
                BodyId(free as u32)
            }
            None => {
                self.slots.push(Some(body));
                BodyId(self.slots.len() as u32 - 1)
            }
        }
    }

    /// Spawn a fully assembled body.
    pub fn spawn_body(
        &mut self,
        transform: Transform,
        shape: Shape,
        rigid: RigidBody,
        material: Material,
    ) -> BodyId {
        let id = self.spawn(transform);
        let body = self.slots[id.0 as usize].as_mut().unwrap();
        body.shape = Some(shape);
        body.rigid = Some(rigid);
        body.material = Some(material);
        id
    }

    /// Remove a body, freeing its slot. Its transform stays in the arena so
    /// child handles elsewhere remain valid. Returns `false` for a dead id.
    pub fn remove(&mut self, id: BodyId) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                true
            }
            _ => {
                log::debug!("remove: no body at {id:?}");
                false
            }
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Live bodies in slot order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|body| (BodyId(i as u32), body)))
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// The transform arena (read-only; mutate through the world).
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// A body's transform.
    pub fn transform(&self, id: BodyId) -> Option<&Transform> {
        self.body(id).map(|body| self.transforms.get(body.transform_id()))
    }

    /// A body's world position.
    pub fn position(&self, id: BodyId) -> Option<DVec2> {
        self.transform(id).map(|t| t.position)
    }

    /// World-space vertex ring of a body's collider, for wireframe drawing.
    /// `None` for circles and shapeless bodies.
    pub fn world_vertices(&self, id: BodyId) -> Option<Vec<DVec2>> {
        let body = self.body(id)?;
        let transform = self.transforms.get(body.transform_id());
        body.shape.as_ref()?.world_vertices(transform)
    }

    // === Sanctioned mutators ===
    // Going through these keeps attached child transforms consistent;
    // writing a transform directly would desync the tree.

    /// Move a body to an absolute position (children keep their offsets).
    pub fn set_pos(&mut self, id: BodyId, pos: DVec2) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.set_pos(tid, pos);
        }
    }

    /// Translate a body by `diff` (children follow).
    pub fn change_pos(&mut self, id: BodyId, diff: DVec2) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.change_pos(tid, diff);
        }
    }

    /// Set a body's absolute rotation (children orbit).
    pub fn set_rot(&mut self, id: BodyId, rot: f64) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.set_rot(tid, rot);
        }
    }

    /// Rotate a body by `delta` radians (children orbit).
    pub fn rotate(&mut self, id: BodyId, delta: f64) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.rotate(tid, delta);
        }
    }

    /// Set a body's absolute scale (children scale about this body's
    /// origin). Rejected when the current scale has a zero component.
    pub fn set_scale(&mut self, id: BodyId, scale: DVec2) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.set_scale(tid, scale);
        }
    }

    /// Replace a body's position, rotation and scale in one call, with all
    /// three deltas cascading to attached children. Rejected when the
    /// current scale has a zero component.
    pub fn set_transform(&mut self, id: BodyId, position: DVec2, rotation: f64, scale: DVec2) {
        if let Some(tid) = self.transform_id_of(id) {
            self.transforms.set_transform(tid, position, rotation, scale);
        }
    }

    /// Attach `child`'s transform under `parent`'s; same rejection rules as
    /// [`Transforms::attach`].
    pub fn attach(&mut self, parent: BodyId, child: BodyId) -> bool {
        match (self.transform_id_of(parent), self.transform_id_of(child)) {
            (Some(p), Some(c)) => self.transforms.attach(p, c),
            _ => false,
        }
    }

    /// Accumulate a force on a body for the next step.
    pub fn add_force(&mut self, id: BodyId, force: DVec2) {
        if let Some(rigid) = self.rigid_mut(id) {
            rigid.add_force(force);
        }
    }

    /// Accumulate a torque on a body for the next step.
    pub fn add_torque(&mut self, id: BodyId, torque: f64) {
        if let Some(rigid) = self.rigid_mut(id) {
            rigid.add_torque(torque);
        }
    }

    /// Apply an instantaneous impulse to a body's linear velocity.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: DVec2) {
        if let Some(rigid) = self.rigid_mut(id) {
            rigid.apply_impulse(impulse);
        }
    }

    /// Overwrite a body's linear velocity.
    pub fn set_velocity(&mut self, id: BodyId, velocity: DVec2) {
        if let Some(rigid) = self.rigid_mut(id) {
            rigid.velocity = velocity;
        }
    }

    fn transform_id_of(&self, id: BodyId) -> Option<TransformId> {
        match self.body(id) {
            Some(body) => Some(body.transform_id()),
            None => {
                log::debug!("no body at {id:?}, mutation skipped");
                None
            }
        }
    }

    pub(crate) fn rigid_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.body_mut(id)?.rigid.as_mut()
    }

    /// Ids of live bodies carrying a collider, in slot order.
    pub(crate) fn shaped_body_ids(&self) -> Vec<BodyId> {
        self.bodies()
            .filter(|(_, body)| body.shape.is_some())
            .map(|(id, _)| id)
            .collect()
    }

    // === Stepping ===

    /// Advance the simulation by `dt` seconds: gravity → force/torque
    /// integration → velocity/rotation integration → collision resolution.
    pub fn step(&mut self, dt: f64) {
        self.apply_gravity();
        self.integrate_forces(dt);
        self.integrate_velocities(dt);
        resolver::resolve(self);
    }

    fn apply_gravity(&mut self) {
        if self.gravity == DVec2::ZERO {
            return;
        }
        let gravity = self.gravity;
        for slot in self.slots.iter_mut().flatten() {
            if let Some(rigid) = body_dynamic_rigid(slot) {
                rigid.force += gravity * rigid.mass;
            }
        }
    }

    /// Semi-implicit Euler, velocity half: accumulated force and torque
    /// become velocity deltas, then the accumulators clear.
    fn integrate_forces(&mut self, dt: f64) {
        for slot in self.slots.iter_mut().flatten() {
            if let Some(rigid) = slot.rigid.as_mut() {
                rigid.velocity += rigid.force * rigid.inv_mass * dt;
                rigid.angular_velocity += rigid.torque * rigid.inv_inertia * dt;
                rigid.force = DVec2::ZERO;
                rigid.torque = 0.0;
            }
        }
    }

    /// Position half: velocities move the transforms through the
    /// child-dragging arena ops.
    fn integrate_velocities(&mut self, dt: f64) {
        for i in 0..self.slots.len() {
            let Some(body) = self.slots[i].as_ref() else {
                continue;
            };
            let Some(rigid) = body.rigid else {
                continue;
            };
            let tid = body.transform_id();
            if rigid.velocity != DVec2::ZERO {
                self.transforms.change_pos(tid, rigid.velocity * dt);
            }
            if rigid.angular_velocity != 0.0 {
                self.transforms.rotate(tid, rigid.angular_velocity * dt);
            }
        }
    }

    // === Snapshots ===

    /// Serialize the whole world to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a world from [`to_json`](Self::to_json) output. The restored
    /// world continues bit-identically to the original.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Mutable rigid access for dynamic (movable) bodies only.
fn body_dynamic_rigid(body: &mut Body) -> Option<&mut RigidBody> {
    body.rigid.as_mut().filter(|rigid| rigid.inv_mass > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dynamic_circle(world: &mut World, pos: DVec2) -> BodyId {
        world.spawn_body(
            Transform::at(pos),
            Shape::circle(1.0),
            RigidBody::new(2.0, 1.0),
            Material::default(),
        )
    }

    #[test]
    fn test_force_integration_is_semi_implicit() {
        let mut world = World::new();
        let id = dynamic_circle(&mut world, DVec2::ZERO);
        world.add_force(id, DVec2::new(4.0, 0.0));

        world.step(0.5);

        let rigid = world.body(id).unwrap().rigid.unwrap();
        // v = F/m * dt = 1, and the new velocity moves the body this step
        assert_abs_diff_eq!(rigid.velocity.x, 1.0);
        assert_abs_diff_eq!(world.position(id).unwrap().x, 0.5);
        // Accumulator cleared
        assert_eq!(rigid.force, DVec2::ZERO);
    }

    #[test]
    fn test_torque_integration() {
        let mut world = World::new();
        let id = dynamic_circle(&mut world, DVec2::ZERO);
        world.add_torque(id, 2.0);

        world.step(0.5);

        let rigid = world.body(id).unwrap().rigid.unwrap();
        assert_abs_diff_eq!(rigid.angular_velocity, 1.0);
        assert_abs_diff_eq!(world.transform(id).unwrap().rotation, 0.5);
        assert_eq!(rigid.torque, 0.0);
    }

    #[test]
    fn test_gravity_accelerates_dynamic_only() {
        let mut world = World::new();
        world.gravity = DVec2::new(0.0, -10.0);
        let ball = dynamic_circle(&mut world, DVec2::new(0.0, 100.0));
        let wall = world.spawn_body(
            Transform::at(DVec2::ZERO),
            Shape::aabb(DVec2::new(-5.0, -5.0), DVec2::new(5.0, 5.0)),
            RigidBody::fixed(),
            Material::default(),
        );

        world.step(0.1);

        assert_abs_diff_eq!(world.body(ball).unwrap().rigid.unwrap().velocity.y, -1.0);
        assert_eq!(world.body(wall).unwrap().rigid.unwrap().velocity, DVec2::ZERO);
        assert_eq!(world.position(wall).unwrap(), DVec2::ZERO);
    }

    #[test]
    fn test_velocity_integration_drags_children() {
        let mut world = World::new();
        let parent = dynamic_circle(&mut world, DVec2::ZERO);
        let child = world.spawn(Transform::at(DVec2::new(5.0, 0.0)));
        assert!(world.attach(parent, child));

        world.set_velocity(parent, DVec2::new(10.0, 0.0));
        world.step(1.0);

        assert_abs_diff_eq!(world.position(parent).unwrap().x, 10.0);
        assert_abs_diff_eq!(world.position(child).unwrap().x, 15.0);
    }

    #[test]
    fn test_set_transform_through_world() {
        let mut world = World::new();
        let parent = dynamic_circle(&mut world, DVec2::ZERO);
        let child = world.spawn(Transform::at(DVec2::new(3.0, 0.0)));
        assert!(world.attach(parent, child));

        world.set_transform(parent, DVec2::new(10.0, 0.0), 0.0, DVec2::ONE);
        assert_eq!(world.position(parent).unwrap(), DVec2::new(10.0, 0.0));
        // Child keeps its (3, 0) offset
        assert_eq!(world.position(child).unwrap(), DVec2::new(13.0, 0.0));
    }

    #[test]
    fn test_remove_frees_and_reuses_slot() {
        let mut world = World::new();
        let a = dynamic_circle(&mut world, DVec2::ZERO);
        let b = dynamic_circle(&mut world, DVec2::new(10.0, 0.0));

        assert!(world.remove(a));
        assert!(!world.remove(a));
        assert_eq!(world.body_count(), 1);

        let c = world.spawn(Transform::at(DVec2::new(20.0, 0.0)));
        // Slot of `a` is reused
        assert_eq!(c, a);
        assert_eq!(world.body_count(), 2);
        assert!(world.body(b).is_some());
    }

    #[test]
    fn test_mutators_noop_on_dead_id() {
        let mut world = World::new();
        let id = dynamic_circle(&mut world, DVec2::ZERO);
        world.remove(id);

        // None of these may panic or resurrect the body
        world.set_pos(id, DVec2::new(1.0, 1.0));
        world.set_transform(id, DVec2::ZERO, 1.0, DVec2::ONE);
        world.add_force(id, DVec2::X);
        world.apply_impulse(id, DVec2::X);
        world.step(0.1);
        assert!(world.body(id).is_none());
    }

    #[test]
    fn test_world_vertices_query() {
        let mut world = World::new();
        let boxy = world.spawn_body(
            Transform::at(DVec2::new(1.0, 0.0)),
            Shape::aabb(DVec2::new(-1.0, -1.0), DVec2::new(1.0, 1.0)),
            RigidBody::fixed(),
            Material::default(),
        );
        let ball = dynamic_circle(&mut world, DVec2::ZERO);

        let ring = world.world_vertices(boxy).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], DVec2::new(0.0, -1.0));
        assert!(world.world_vertices(ball).is_none());
    }

    #[test]
    fn test_json_snapshot_round_trip() {
        let mut world = World::new();
        world.gravity = DVec2::new(0.0, -50.0);
        let id = dynamic_circle(&mut world, DVec2::new(0.0, 10.0));
        world.set_velocity(id, DVec2::new(3.0, 0.0));
        world.step(1.0 / 60.0);

        let mut restored = World::from_json(&world.to_json().unwrap()).unwrap();
        world.step(1.0 / 60.0);
        restored.step(1.0 / 60.0);

        assert_eq!(world.position(id), restored.position(id));
        assert_eq!(
            world.body(id).unwrap().rigid.unwrap().velocity,
            restored.body(id).unwrap().rigid.unwrap().velocity
        );
    }
}
