//! Broad-phase queries exposed through `World`: AABB overlap queries and ray
//! casts against the dynamic tree.

use rigid2d::body::{BodyConf, BodyType};
use rigid2d::fixture::FixtureConf;
use rigid2d::math::vec2;
use rigid2d::shapes::{Aabb, Disk, Polygon, Shape};
use rigid2d::world::World;

#[test]
fn query_aabb_finds_only_fixtures_whose_fattened_aabb_overlaps() {
    let mut world = World::new(vec2(0.0, 0.0));

    let near = world
        .create_body(&BodyConf { body_type: BodyType::Static, position: vec2(0.0, 0.0), ..Default::default() })
        .unwrap();
    let near_fixture = world
        .create_fixture(near, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5)), ..Default::default() })
        .unwrap();

    let far = world
        .create_body(&BodyConf { body_type: BodyType::Static, position: vec2(100.0, 100.0), ..Default::default() })
        .unwrap();
    world
        .create_fixture(far, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5)), ..Default::default() })
        .unwrap();

    let query_box = Aabb::new(vec2(-1.0, -1.0), vec2(1.0, 1.0));
    let mut hits = Vec::new();
    world.query_aabb(&query_box, |fixture_id, _child| {
        hits.push(fixture_id);
        true
    });

    assert_eq!(hits, vec![near_fixture]);
}

#[test]
fn ray_cast_hits_the_nearer_of_two_fixtures_in_its_path() {
    let mut world = World::new(vec2(0.0, 0.0));

    let near = world
        .create_body(&BodyConf { body_type: BodyType::Static, position: vec2(5.0, 0.0), ..Default::default() })
        .unwrap();
    let near_fixture = world
        .create_fixture(near, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5)), ..Default::default() })
        .unwrap();

    let far = world
        .create_body(&BodyConf { body_type: BodyType::Static, position: vec2(20.0, 0.0), ..Default::default() })
        .unwrap();
    world
        .create_fixture(far, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5)), ..Default::default() })
        .unwrap();

    // Resolves each candidate's own entry fraction along the ray (a simple
    // axis-aligned circle intersection) and shrinks the tree's search window
    // to that fraction, the way an embedder's own shape ray-cast would.
    let radius = 0.5f32;
    let mut best_fraction = 1.0f32;
    let mut first_hit = None;
    world.ray_cast(vec2(0.0, 0.0), vec2(30.0, 0.0), |fixture_id, _child, input| {
        let center_x = if fixture_id == near_fixture { 5.0 } else { 20.0 };
        let entry_x = center_x - radius;
        let fraction = entry_x / 30.0;
        if fraction <= input.max_fraction && fraction < best_fraction {
            best_fraction = fraction;
            first_hit = Some(fixture_id);
        }
        best_fraction
    });

    assert_eq!(first_hit, Some(near_fixture));
}

#[test]
fn proxy_count_tracks_fixture_and_child_count() {
    let mut world = World::new(vec2(0.0, 0.0));
    assert_eq!(world.proxy_count(), 0);

    let body = world
        .create_body(&BodyConf { body_type: BodyType::Static, ..Default::default() })
        .unwrap();
    world
        .create_fixture(body, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 1.0)), ..Default::default() })
        .unwrap();
    assert_eq!(world.proxy_count(), 1);

    world
        .create_fixture(body, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(1.0, 1.0)), ..Default::default() })
        .unwrap();
    assert_eq!(world.proxy_count(), 2);
}

#[test]
fn moving_bodies_keep_the_tree_internally_consistent() {
    let mut world = World::new(vec2(0.0, -10.0));

    let ground = world
        .create_body(&BodyConf { body_type: BodyType::Static, ..Default::default() })
        .unwrap();
    world
        .create_fixture(ground, &FixtureConf { shape: Shape::Polygon(Polygon::box_shape(20.0, 1.0)), ..Default::default() })
        .unwrap();

    for i in 0..20 {
        let body = world
            .create_body(&BodyConf {
                body_type: BodyType::Dynamic,
                position: vec2(i as f32 * 0.3, 5.0 + i as f32 * 0.5),
                ..Default::default()
            })
            .unwrap();
        world
            .create_fixture(body, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.4)), ..Default::default() })
            .unwrap();
    }

    for _ in 0..60 {
        world.step(1.0 / 60.0, 8, 3, None);
    }

    // The tree should stay reasonably balanced (height grows roughly
    // logarithmically with proxy count, never degenerating to a linked list).
    let proxies = world.proxy_count() as f64;
    let height = world.tree_height() as f64;
    assert!(height <= proxies, "tree height {height} should never exceed the proxy count {proxies}");
}
