//! End-to-end simulation scenarios
//!
//! These tests drive whole worlds through many steps using only the public
//! API: approach/bounce behavior, resting contact, determinism, and
//! snapshot-restore continuation. Fixed timestep, no randomness except the
//! explicitly seeded soup test.

use glam::DVec2;
use impulse2d::{Material, RigidBody, Shape, Transform, World};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const DT: f64 = 1.0 / 60.0;

/// Advance `world` by `steps` fixed ticks.
fn run_world(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.step(DT);
    }
}

fn frictionless(restitution: f64) -> Material {
    Material {
        restitution,
        static_friction: 0.0,
        dynamic_friction: 0.0,
        ..Material::default()
    }
}

/// Two r=100 m=10 e=0.8 circles closing head-on at 50 each: they must meet
/// near the midpoint, separate with 0.8 of the closing speed, and never
/// overlap meaningfully once separated.
#[test]
fn test_two_circle_head_on_bounce() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut world = World::new();
    let radius = 100.0;
    let mass = 10.0;
    let inertia = 0.5 * mass * radius * radius;

    let mut up = RigidBody::new(mass, inertia);
    up.velocity = DVec2::new(0.0, -50.0);
    let a = world.spawn_body(
        Transform::at(DVec2::new(0.0, 300.0)),
        Shape::circle(radius),
        up,
        frictionless(0.8),
    );

    let mut down = RigidBody::new(mass, inertia);
    down.velocity = DVec2::new(0.0, 50.0);
    let b = world.spawn_body(
        Transform::at(DVec2::new(0.0, -300.0)),
        Shape::circle(radius),
        down,
        frictionless(0.8),
    );

    let mut collided = false;
    let mut worst_overlap_after_bounce: f64 = 0.0;
    for _ in 0..720 {
        world.step(DT);
        let pa = world.position(a).unwrap();
        let pb = world.position(b).unwrap();
        let overlap = 2.0 * radius - (pa - pb).length();

        if !collided {
            let va = world.body(a).unwrap().rigid.unwrap().velocity;
            if va.y > 0.0 {
                // The impulse fired: both circles were still near the midpoint
                collided = true;
                assert!(pa.y.abs() < 110.0, "collision happened away from center: {}", pa.y);
                assert!(pb.y.abs() < 110.0);

                let vb = world.body(b).unwrap().rigid.unwrap().velocity;
                // Closing speed 100 leaves at restitution 0.8 -> 80
                let separating = va.y - vb.y;
                assert!(
                    (separating - 80.0).abs() < 1e-6,
                    "separating speed {separating}, expected 80"
                );
            }
        } else {
            worst_overlap_after_bounce = worst_overlap_after_bounce.max(overlap);
        }
    }

    assert!(collided, "circles never met");
    assert!(
        worst_overlap_after_bounce < 2.0,
        "residual overlap {worst_overlap_after_bounce} after bounce"
    );
}

/// A square polygon dropped onto a static platform under constant downward
/// force must come to rest on the surface instead of sinking or jittering.
#[test]
fn test_square_rests_on_platform() {
    let mut world = World::new();
    world.gravity = DVec2::new(0.0, -100.0);

    let grippy = Material {
        restitution: 0.0,
        static_friction: 0.5,
        dynamic_friction: 0.4,
        ..Material::default()
    };

    world.spawn_body(
        Transform::at(DVec2::new(0.0, -10.0)),
        Shape::aabb(DVec2::new(-200.0, -10.0), DVec2::new(200.0, 10.0)),
        RigidBody::fixed(),
        grippy,
    );

    let square_shape = Shape::polygon(impulse2d::sim::rectangle(40.0, 40.0)).unwrap();
    let mass = 10.0;
    let inertia = mass * (40.0_f64 * 40.0 + 40.0 * 40.0) / 12.0;
    let square = world.spawn_body(
        Transform::at(DVec2::new(0.0, 25.0)),
        square_shape,
        RigidBody::new(mass, inertia),
        grippy,
    );

    run_world(&mut world, 600);

    let rigid = world.body(square).unwrap().rigid.unwrap();
    let pos = world.position(square).unwrap();
    assert!(
        rigid.velocity.length() < 1.0,
        "square still moving at {:?}",
        rigid.velocity
    );
    assert!(
        rigid.angular_velocity.abs() < 0.5,
        "square still spinning at {}",
        rigid.angular_velocity
    );
    // Resting center: half-height above the platform top (y=0), minus the
    // equilibrium penetration the single-pass solver tolerates
    assert!(
        (19.0..21.0).contains(&pos.y),
        "square at y={}, expected to rest near 20",
        pos.y
    );
    assert!(pos.x.abs() < 1.0, "square drifted to x={}", pos.x);
}

/// Identical spawn sequences produce bit-identical trajectories.
#[test]
fn test_deterministic_replay() {
    fn build_and_run() -> Vec<DVec2> {
        let mut world = World::new();
        world.gravity = DVec2::new(0.0, -60.0);

        world.spawn_body(
            Transform::at(DVec2::new(0.0, -50.0)),
            Shape::aabb(DVec2::new(-300.0, -10.0), DVec2::new(300.0, 10.0)),
            RigidBody::fixed(),
            Material::default(),
        );
        let mut ids = Vec::new();
        for i in 0..6 {
            let x = -100.0 + 40.0 * i as f64;
            let shape = if i % 2 == 0 {
                Shape::circle(15.0)
            } else {
                Shape::polygon(impulse2d::sim::regular_polygon(5, 15.0)).unwrap()
            };
            let mut rigid = RigidBody::from_shape(&shape, 1.0);
            rigid.velocity = DVec2::new(10.0 - 3.0 * i as f64, 0.0);
            ids.push(world.spawn_body(
                Transform::at(DVec2::new(x, 60.0 + 10.0 * i as f64)),
                shape,
                rigid,
                Material::default(),
            ));
        }

        run_world(&mut world, 240);
        ids.iter().map(|&id| world.position(id).unwrap()).collect()
    }

    let first = build_and_run();
    let second = build_and_run();
    // Bit-exact equality, not just "close"
    assert_eq!(first, second);
}

/// Restoring a JSON snapshot mid-run continues exactly like the original.
#[test]
fn test_snapshot_restore_continues_identically() {
    let mut world = World::new();
    world.gravity = DVec2::new(0.0, -80.0);
    world.spawn_body(
        Transform::at(DVec2::new(0.0, -30.0)),
        Shape::aabb(DVec2::new(-200.0, -10.0), DVec2::new(200.0, 10.0)),
        RigidBody::fixed(),
        Material::default(),
    );
    let ball = world.spawn_body(
        Transform::at(DVec2::new(-50.0, 80.0)),
        Shape::circle(10.0),
        {
            let mut rigid = RigidBody::new(4.0, 200.0);
            rigid.velocity = DVec2::new(30.0, 0.0);
            rigid
        },
        Material::default(),
    );

    run_world(&mut world, 60);
    let snapshot = world.to_json().unwrap();
    let mut restored = World::from_json(&snapshot).unwrap();

    run_world(&mut world, 60);
    run_world(&mut restored, 60);

    assert_eq!(world.position(ball), restored.position(ball));
    assert_eq!(
        world.body(ball).unwrap().rigid.unwrap().velocity,
        restored.body(ball).unwrap().rigid.unwrap().velocity
    );
}

/// A seeded pile of mixed bodies stays finite: no NaN, no runaway
/// velocities, no body flung outside the arena by degenerate contacts.
#[test]
fn test_seeded_soup_stays_finite() {
    let mut rng = Pcg32::seed_from_u64(0xC0FFEE);
    let mut world = World::new();
    world.gravity = DVec2::new(0.0, -120.0);

    // Static bowl: floor and two walls
    let wall_mat = Material::default();
    world.spawn_body(
        Transform::at(DVec2::new(0.0, -200.0)),
        Shape::aabb(DVec2::new(-250.0, -20.0), DVec2::new(250.0, 20.0)),
        RigidBody::fixed(),
        wall_mat,
    );
    for side in [-260.0, 260.0] {
        world.spawn_body(
            Transform::at(DVec2::new(side, 0.0)),
            Shape::aabb(DVec2::new(-20.0, -220.0), DVec2::new(20.0, 220.0)),
            RigidBody::fixed(),
            wall_mat,
        );
    }

    let mut ids = Vec::new();
    for i in 0..20 {
        let pos = DVec2::new(rng.random_range(-180.0..180.0), rng.random_range(-100.0..150.0));
        let shape = match i % 3 {
            0 => Shape::circle(rng.random_range(5.0..20.0)),
            1 => Shape::aabb(DVec2::new(-10.0, -10.0), DVec2::new(10.0, 10.0)),
            _ => Shape::polygon(impulse2d::sim::regular_polygon(
                rng.random_range(3..7),
                rng.random_range(8.0..18.0),
            ))
            .unwrap(),
        };
        let mut rigid = RigidBody::from_shape(&shape, 1.0);
        rigid.velocity = DVec2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
        rigid.angular_velocity = rng.random_range(-2.0..2.0);
        ids.push(world.spawn_body(Transform::at(pos), shape, rigid, Material::default()));
    }

    run_world(&mut world, 300);

    for id in ids {
        let pos = world.position(id).unwrap();
        let rigid = world.body(id).unwrap().rigid.unwrap();
        assert!(pos.is_finite(), "position went non-finite: {pos:?}");
        assert!(rigid.velocity.is_finite(), "velocity went non-finite");
        assert!(rigid.angular_velocity.is_finite(), "spin went non-finite");
        assert!(
            pos.length() < 2000.0,
            "body flung out of the arena to {pos:?}"
        );
    }
}
