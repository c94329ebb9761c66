//! Collision resolution
//!
//! One pass per step: every unique pair of shaped bodies is tested in slot
//! order, and each detected contact gets a normal impulse (with angular
//! contributions), a positional correction, and a Coulomb friction impulse,
//! plus an emergency separation path for pathologically deep overlaps.
//! Single-pass solving is order-dependent for three or more mutually
//! touching bodies; that is an accepted approximation.
//!
//! Every sub-step guards for missing parts (shape, rigid body, material)
//! and skips silently rather than failing the step; near-zero denominators
//! are skipped rather than propagated as NaN.

use glam::DVec2;

use super::body::{Material, RigidBody};
use super::collision::{self, Contact};
use super::shape::Shape;
use super::world::{BodyId, World};
use crate::{angular_point_velocity, cross};

/// Run one resolver pass over every unique pair, in slot order.
pub(crate) fn resolve(world: &mut World) {
    let candidates = world.shaped_body_ids();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            resolve_pair(world, candidates[i], candidates[j]);
        }
    }
}

fn resolve_pair(world: &mut World, a: BodyId, b: BodyId) {
    let Some((contact, point)) = detect(world, a, b) else {
        return;
    };
    let j = apply_normal_impulse(world, a, b, &contact, point);
    apply_positional_correction(world, a, b, &contact);
    if j != 0.0 {
        apply_friction(world, a, b, &contact, point, j);
    }
    separate_stuck_pair(world, a, b);
}

/// Dispatch on the shape-kind pair. Returns the contact (normal from `a`
/// toward `b`) and the approximate contact point.
fn detect(world: &World, a: BodyId, b: BodyId) -> Option<(Contact, DVec2)> {
    let body_a = world.body(a)?;
    let body_b = world.body(b)?;
    let shape_a = body_a.shape.as_ref()?;
    let shape_b = body_b.shape.as_ref()?;
    let tr_a = world.transforms().get(body_a.transform_id());
    let tr_b = world.transforms().get(body_b.transform_id());
    let pa = tr_a.position;
    let pb = tr_b.position;

    // Circle-circle contacts sit on the center line weighted by the
    // opposite radius; every other pair approximates with the origin
    // midpoint nudged half the penetration along the normal.
    let contact = match (shape_a, shape_b) {
        (Shape::Circle { radius: r1 }, Shape::Circle { radius: r2 }) => {
            let contact = collision::circle_circle(pa, *r1, pb, *r2)?;
            let total = r1 + r2;
            let point = pa * (*r2 / total) + pb * (*r1 / total);
            return Some((contact, point));
        }
        (Shape::Circle { radius }, Shape::Aabb { min, max }) => {
            collision::circle_rotated_aabb(pa, *radius, tr_b, *min, *max)?.flipped()
        }
        (Shape::Aabb { min, max }, Shape::Circle { radius }) => {
            collision::circle_rotated_aabb(pb, *radius, tr_a, *min, *max)?
        }
        (Shape::Circle { radius }, Shape::Polygon { .. }) => {
            let ring = shape_b.world_vertices(tr_b)?;
            collision::polygon_circle(&ring, pa, *radius)?.flipped()
        }
        (Shape::Polygon { .. }, Shape::Circle { radius }) => {
            let ring = shape_a.world_vertices(tr_a)?;
            collision::polygon_circle(&ring, pb, *radius)?
        }
        // Box-box, polygon-polygon and the mixed pair all reduce to SAT
        // over the two world-space vertex rings.
        _ => {
            let ring_a = shape_a.world_vertices(tr_a)?;
            let ring_b = shape_b.world_vertices(tr_b)?;
            collision::sat_polygons(&ring_a, &ring_b)?
        }
    };

    let point = (pa + pb) * 0.5 + contact.normal * (contact.penetration * 0.5);
    Some((contact, point))
}

/// Snapshot of the parts both impulse passes need.
fn pair_dynamics(
    world: &World,
    a: BodyId,
    b: BodyId,
) -> Option<(RigidBody, Material, DVec2, RigidBody, Material, DVec2)> {
    let body_a = world.body(a)?;
    let body_b = world.body(b)?;
    let ra = body_a.rigid?;
    let rb = body_b.rigid?;
    let ma = body_a.material?;
    let mb = body_b.material?;
    let pa = world.transforms().get(body_a.transform_id()).position;
    let pb = world.transforms().get(body_b.transform_id()).position;
    Some((ra, ma, pa, rb, mb, pb))
}

/// Normal impulse solving for restitution, with angular contributions.
/// Returns the applied impulse magnitude (0 when skipped).
fn apply_normal_impulse(
    world: &mut World,
    a: BodyId,
    b: BodyId,
    contact: &Contact,
    point: DVec2,
) -> f64 {
    let Some((ra, ma, pa, rb, mb, pb)) = pair_dynamics(world, a, b) else {
        return 0.0;
    };
    let eps = world.tuning.epsilon;

    let r1 = point - pa;
    let r2 = point - pb;
    let v1 = ra.velocity + angular_point_velocity(ra.angular_velocity, r1);
    let v2 = rb.velocity + angular_point_velocity(rb.angular_velocity, r2);
    let along_normal = contact.normal.dot(v2 - v1);

    // Separating or resting: leave it to positional correction
    if along_normal > -eps {
        return 0.0;
    }

    let cross1 = cross(r1, contact.normal);
    let cross2 = cross(r2, contact.normal);
    let denom = ra.inv_mass
        + rb.inv_mass
        + cross1 * cross1 * ra.inv_inertia
        + cross2 * cross2 * rb.inv_inertia;
    if denom <= eps {
        return 0.0;
    }

    let e = ma.restitution.min(mb.restitution);
    let mut j = -(1.0 + e) * along_normal / denom;
    let ceiling = world.tuning.max_impulse;
    if j.abs() > ceiling {
        log::debug!("normal impulse {j:.1} clamped to {ceiling}");
        j = j.clamp(-ceiling, ceiling);
    }

    let impulse = contact.normal * j;
    if let Some(rigid) = world.rigid_mut(a) {
        rigid.velocity -= impulse * rigid.inv_mass;
        rigid.angular_velocity -= j * cross1 * rigid.inv_inertia;
    }
    if let Some(rigid) = world.rigid_mut(b) {
        rigid.velocity += impulse * rigid.inv_mass;
        rigid.angular_velocity += j * cross2 * rigid.inv_inertia;
    }
    j
}

/// Coulomb friction along the contact tangent, scaled against the normal
/// impulse `j`.
fn apply_friction(world: &mut World, a: BodyId, b: BodyId, contact: &Contact, point: DVec2, j: f64) {
    let Some((ra, ma, pa, rb, mb, pb)) = pair_dynamics(world, a, b) else {
        return;
    };
    let eps = world.tuning.epsilon;

    let r1 = point - pa;
    let r2 = point - pb;
    let v1 = ra.velocity + angular_point_velocity(ra.angular_velocity, r1);
    let v2 = rb.velocity + angular_point_velocity(rb.angular_velocity, r2);
    let rel = v2 - v1;

    let tangent = rel - contact.normal * rel.dot(contact.normal);
    if tangent.length() < eps {
        return;
    }
    let tangent = tangent.normalize();

    let cross1 = cross(r1, tangent);
    let cross2 = cross(r2, tangent);
    let denom = ra.inv_mass
        + rb.inv_mass
        + cross1 * cross1 * ra.inv_inertia
        + cross2 * cross2 * rb.inv_inertia;
    if denom <= eps {
        return;
    }

    let jt = -rel.dot(tangent) / denom;
    let static_mu = (ma.static_friction * ma.static_friction
        + mb.static_friction * mb.static_friction)
        .sqrt();
    let mut friction_impulse = if jt.abs() < j * static_mu {
        tangent * jt
    } else {
        let dynamic_mu = (ma.dynamic_friction * ma.dynamic_friction
            + mb.dynamic_friction * mb.dynamic_friction)
            .sqrt();
        tangent * (-j * dynamic_mu)
    };

    let ceiling = world.tuning.max_friction_impulse;
    if friction_impulse.length() > ceiling {
        log::debug!("friction impulse clamped to {ceiling}");
        friction_impulse = friction_impulse.normalize() * ceiling;
    }

    if let Some(rigid) = world.rigid_mut(a) {
        let delta = friction_impulse * rigid.inv_mass;
        rigid.velocity -= delta;
        rigid.angular_velocity -= cross(r1, friction_impulse) * rigid.inv_inertia;
    }
    if let Some(rigid) = world.rigid_mut(b) {
        let delta = friction_impulse * rigid.inv_mass;
        rigid.velocity += delta;
        rigid.angular_velocity += cross(r2, friction_impulse) * rigid.inv_inertia;
    }
}

/// Baumgarte positional correction: remove a fraction of the penetration by
/// moving both bodies along the normal, weighted by inverse mass. Very deep
/// overlaps take a one-shot full separation instead.
fn apply_positional_correction(world: &mut World, a: BodyId, b: BodyId, contact: &Contact) {
    let inv1 = match world.body(a).and_then(|body| body.rigid) {
        Some(rigid) => rigid.inv_mass,
        None => return,
    };
    let inv2 = match world.body(b).and_then(|body| body.rigid) {
        Some(rigid) => rigid.inv_mass,
        None => return,
    };

    let tuning = world.tuning.clone();
    if contact.penetration < tuning.penetration_slop {
        return;
    }
    let total = inv1 + inv2;
    if total <= tuning.epsilon {
        return;
    }

    let deep = contact.penetration > tuning.deep_penetration;
    let percent = if deep {
        log::debug!(
            "emergency separation: penetration {:.2} exceeds {:.2}",
            contact.penetration,
            tuning.deep_penetration
        );
        1.0
    } else {
        tuning.correction_percent
    };

    let mut correction = contact.normal * (percent * contact.penetration / total);
    if !deep && correction.length() > tuning.max_correction {
        correction = correction.normalize() * tuning.max_correction;
    }

    world.change_pos(a, correction * -inv1);
    world.change_pos(b, correction * inv2);
}

/// Last-resort separation for pairs whose centers have sunk far inside each
/// other: bypass the impulse math and push them apart along the center
/// line, inversely proportional to mass.
fn separate_stuck_pair(world: &mut World, a: BodyId, b: BodyId) {
    let (Some(body_a), Some(body_b)) = (world.body(a), world.body(b)) else {
        return;
    };
    let (Some(ra), Some(rb)) = (body_a.rigid, body_b.rigid) else {
        return;
    };
    let pa = world.transforms().get(body_a.transform_id()).position;
    let pb = world.transforms().get(body_b.transform_id()).position;
    let expected = match (extent_radius(world, a), extent_radius(world, b)) {
        (Some(ea), Some(eb)) => ea + eb,
        _ => return,
    };

    let tuning = world.tuning.clone();
    let delta = pb - pa;
    let distance = delta.length();
    if distance >= tuning.stuck_fraction * expected {
        return;
    }

    let total = ra.inv_mass + rb.inv_mass;
    if total <= tuning.epsilon {
        return;
    }
    let direction = if distance > tuning.epsilon {
        delta / distance
    } else {
        DVec2::X
    };

    // Half the deficit per step: firm enough to escape, soft enough not to
    // teleport.
    let push = 0.5 * (expected - distance);
    log::debug!("stuck pair: centers {distance:.2} apart, expected {expected:.2}");
    world.change_pos(a, direction * (-push * ra.inv_mass / total));
    world.change_pos(b, direction * (push * rb.inv_mass / total));
}

fn extent_radius(world: &World, id: BodyId) -> Option<f64> {
    world
        .body(id)
        .and_then(|body| body.shape.as_ref())
        .map(Shape::extent_radius)
}
