//! End-to-end `World::step` scenarios: a box settling on the ground, a
//! pendulum on a revolute joint, and stacked boxes falling asleep.

use rigid2d::body::{BodyConf, BodyType};
use rigid2d::fixture::FixtureConf;
use rigid2d::joints::{Joint, JointKind, RevoluteJointDef};
use rigid2d::math::vec2;
use rigid2d::shapes::{Polygon, Shape};
use rigid2d::world::World;

fn ground(world: &mut World) {
    let id = world
        .create_body(&BodyConf { body_type: BodyType::Static, ..Default::default() })
        .unwrap();
    world
        .create_fixture(
            id,
            &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(50.0, 1.0)), ..Default::default() },
        )
        .unwrap();
}

#[test]
fn box_settles_on_ground_and_eventually_sleeps() {
    let mut world = World::new(vec2(0.0, -10.0));
    ground(&mut world);

    let body = world
        .create_body(&BodyConf { body_type: BodyType::Dynamic, position: vec2(0.0, 3.0), ..Default::default() })
        .unwrap();
    world
        .create_fixture(body, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(0.5, 0.5)), ..Default::default() })
        .unwrap();

    let mut asleep = false;
    for _ in 0..300 {
        let stats = world.step(1.0 / 60.0, 8, 3, None);
        if stats.bodies_slept > 0 {
            asleep = true;
        }
    }
    assert!(asleep, "box should fall asleep once it settles on the ground");

    // Resting height: box half-height (0.5) above the ground's top face (y = 1.0).
    let resting_y = world.bodies[body].world_center().y;
    assert!((resting_y - 1.5).abs() < 0.05, "box should rest at y ~= 1.5, got {resting_y}");
}

#[test]
fn revolute_pendulum_swings_and_preserves_anchor_distance() {
    let mut world = World::new(vec2(0.0, -10.0));

    let anchor = world
        .create_body(&BodyConf { body_type: BodyType::Static, ..Default::default() })
        .unwrap();
    let bob = world
        .create_body(&BodyConf { body_type: BodyType::Dynamic, position: vec2(3.0, 0.0), ..Default::default() })
        .unwrap();
    world
        .create_fixture(bob, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(0.2, 0.2)), ..Default::default() })
        .unwrap();

    let def = RevoluteJointDef { local_anchor_a: vec2(0.0, 0.0), local_anchor_b: vec2(-3.0, 0.0), ..Default::default() };
    let joint = Joint::new(anchor, bob, false, JointKind::Revolute(rigid2d::joints::RevoluteJoint::new(&def)));
    world.create_joint(joint).unwrap();

    for _ in 0..120 {
        world.step(1.0 / 60.0, 8, 3, None);
    }

    let bob_pos = world.bodies[bob].world_center();
    let distance = bob_pos.x.hypot(bob_pos.y);
    assert!((distance - 3.0).abs() < 0.1, "pendulum bob should stay ~3 units from the anchor, got {distance}");
}

#[test]
fn stacked_boxes_settle_without_interpenetrating() {
    let mut world = World::new(vec2(0.0, -10.0));
    ground(&mut world);

    let mut bodies = Vec::new();
    for i in 0..3 {
        let y = 1.0 + 0.5 + i as f32 * 1.01;
        let id = world
            .create_body(&BodyConf { body_type: BodyType::Dynamic, position: vec2(0.0, y), ..Default::default() })
            .unwrap();
        world
            .create_fixture(id, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(0.5, 0.5)), ..Default::default() })
            .unwrap();
        bodies.push(id);
    }

    for _ in 0..400 {
        world.step(1.0 / 60.0, 8, 3, None);
    }

    for pair in bodies.windows(2) {
        let lower = world.bodies[pair[0]].world_center().y;
        let upper = world.bodies[pair[1]].world_center().y;
        assert!(upper > lower + 0.9, "boxes should not have sunk into each other: {lower} vs {upper}");
    }
}

#[test]
fn fast_bullet_does_not_tunnel_through_a_thin_wall() {
    let mut world = World::new(vec2(0.0, 0.0));

    let wall = world
        .create_body(&BodyConf { body_type: BodyType::Static, position: vec2(10.0, 0.0), ..Default::default() })
        .unwrap();
    world
        .create_fixture(wall, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(0.05, 5.0)), ..Default::default() })
        .unwrap();

    // At 800 m/s and a 1/60s step, the bullet would travel 13.3 units in one
    // step without continuous collision -- well past the wall at x=10 -- so
    // this only passes if time-of-impact resolution actually intervenes.
    let bullet = world
        .create_body(&BodyConf {
            body_type: BodyType::Dynamic,
            position: vec2(0.0, 0.0),
            linear_velocity: vec2(800.0, 0.0),
            bullet: true,
            ..Default::default()
        })
        .unwrap();
    world
        .create_fixture(bullet, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(0.05, 0.05)), ..Default::default() })
        .unwrap();

    world.step(1.0 / 60.0, 8, 3, None);

    let x = world.bodies[bullet].world_center().x;
    assert!(x < 10.0, "a bullet body should be stopped by the wall, not pass through it, got x={x}");
}
