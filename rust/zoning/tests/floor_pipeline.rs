// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end zoning runs on small synthetic floor plates.

use approx::assert_relative_eq;
use zonelite_planar::{simplify, Loop, Point2D, Tolerances};
use zonelite_zoning::{
    process_building, process_floor, AnomalyKind, Blueprint, FloorInput, OpeningInput,
    OpeningKind, Region, WallInput, WallKind, ZoningConfig, ZoningError,
};

fn rect_walls(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<WallInput> {
    vec![
        WallInput::line(x0, y0, x1, y0, WallKind::Solid),
        WallInput::line(x1, y0, x1, y1, WallKind::Solid),
        WallInput::line(x1, y1, x0, y1, WallKind::Solid),
        WallInput::line(x0, y1, x0, y0, WallKind::Solid),
    ]
}

fn ring(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(x0, y0),
        Point2D::new(x1, y0),
        Point2D::new(x1, y1),
        Point2D::new(x0, y1),
    ]
}

/// Room of 20 x 10 with a 2 x 2 shaft in the middle.
fn room_with_shaft(index: usize) -> FloorInput {
    let mut floor = FloorInput::new(index);
    floor.walls = rect_walls(0.0, 0.0, 20.0, 10.0);
    floor.walls.extend(rect_walls(8.0, 4.0, 10.0, 6.0));
    floor
}

fn assert_closed(l: &Loop) {
    assert!(l.len() >= 4);
    assert!(l.first().approx_eq(&l.last(), 1e-12));
}

#[test]
fn test_rectangle_with_corner_gap_and_column() {
    let mut floor = FloorInput::new(0);
    floor.walls = vec![
        // The bottom wall stops at both faces of a column.
        WallInput::line(0.0, 0.0, 4.8, 0.0, WallKind::Solid),
        WallInput::line(5.2, 0.0, 10.0, 0.0, WallKind::Solid),
        WallInput::line(10.0, 0.0, 10.0, 8.0, WallKind::Solid),
        WallInput::line(10.0, 8.0, 0.0, 8.0, WallKind::Solid),
        // 1 mm short of the corner.
        WallInput::line(0.0, 8.0, 0.0, 0.001, WallKind::Solid),
    ];
    floor.columns.push(ring(4.8, -0.2, 5.2, 0.2));

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    let regions: Vec<&Region> = outcome.result.regions().collect();
    assert_eq!(regions.len(), 1);
    assert!(regions[0].is_shell());
    assert!(outcome.result.strays.is_empty());
    assert_eq!(outcome.result.summary.strays, 0);

    let boundary = regions[0].outer();
    assert_closed(boundary);
    assert_eq!(boundary.vertices().len(), 4);
    assert!(boundary.first().approx_eq(&Point2D::new(0.0, 0.0), 1e-9));
    assert_relative_eq!(boundary.area(), 80.0, epsilon = 1e-9);
}

#[test]
fn test_column_on_a_continuous_wall() {
    let mut floor = FloorInput::new(0);
    floor.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    floor.columns.push(ring(4.8, -0.2, 5.2, 0.2));

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    let regions: Vec<&Region> = outcome.result.regions().collect();
    assert_eq!(regions.len(), 1);
    assert!(regions[0].is_shell());
    assert!(outcome.result.strays.is_empty());
    assert_relative_eq!(regions[0].outer().area(), 80.0, epsilon = 1e-9);
}

#[test]
fn test_partition_stopping_at_column_splits_room() {
    let mut floor = FloorInput::new(0);
    floor.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    // Stops at the column face, 0.2 short of the wall it stands on.
    let partition = WallInput::line(5.0, 8.0, 5.0, 0.2, WallKind::Partition);
    floor.walls.push(partition);
    floor.columns.push(ring(4.8, -0.2, 5.2, 0.2));

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    let regions: Vec<&Region> = outcome.result.regions().collect();
    assert_eq!(regions.len(), 3);
    assert!(regions[0].is_shell());
    assert_relative_eq!(regions[0].outer().area(), 80.0, epsilon = 1e-9);
    for room in &regions[1..] {
        assert_relative_eq!(room.area(), 40.0, epsilon = 1e-9);
    }
    assert_eq!(outcome.diagnostics.count(AnomalyKind::Debris), 0);
}

#[test]
fn test_room_with_shaft_is_multiply_connected() {
    let floor = room_with_shaft(0);
    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    let block = &outcome.result.blocks[0];
    assert_eq!(outcome.result.blocks.len(), 1);
    assert_eq!(block.nested.len(), 1);

    let labels: Vec<&str> = block.regions.iter().map(Region::label).collect();
    assert_eq!(labels, vec!["F0-B0-SHELL", "F0-B0-R1", "F0-B0-R2"]);

    let room = &block.regions[1];
    assert!(matches!(room, Region::MultiplyConnected { .. }));
    assert_relative_eq!(room.outer().area(), 200.0, epsilon = 1e-9);
    assert_eq!(room.holes().len(), 1);
    let tiles = room.simple_loops();
    assert!(tiles.len() >= 2);
    assert!(tiles.iter().all(|tile| tile.is_simple()));
    let total: f64 = tiles.iter().map(|tile| tile.area()).sum();
    assert_relative_eq!(total, 196.0, epsilon = 1e-6);
    assert_relative_eq!(block.regions[2].area(), 4.0, epsilon = 1e-9);
    assert_eq!(outcome.result.summary.holes, 1);
}

#[test]
fn test_regions_are_closed_and_inside_shell() {
    let mut floor = room_with_shaft(0);
    let partition = WallInput::line(14.0, 0.0, 14.0, 10.0, WallKind::Partition);
    floor.walls.push(partition);
    let tol = Tolerances::default();
    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());

    for block in &outcome.result.blocks {
        let shell = block.shell.as_ref().expect("block has a shell");
        for region in &block.regions {
            assert_closed(region.outer());
            assert!(region.outer().is_ccw());
            if !region.is_shell() {
                assert!(shell.contains_loop(region.outer(), tol.distance));
            }
        }
    }
    assert_eq!(outcome.result.regions().count(), 4);
}

#[test]
fn test_void_rooms_are_removed() {
    let mut floor = room_with_shaft(0);
    floor.voids.push(ring(10.0, 6.0, 8.0, 4.0));
    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());

    assert_eq!(outcome.result.summary.voids, 1);
    assert_eq!(outcome.result.voids.len(), 1);
    assert!(outcome.result.voids[0].is_ccw());
    let regions: Vec<&Region> = outcome.result.regions().collect();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[1].holes().len(), 1);
}

#[test]
fn test_blueprint_aligns_upper_floor() {
    let mut ground = FloorInput::new(0);
    ground.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    let mut upper = FloorInput::new(1);
    upper.walls = rect_walls(0.1, 0.1, 10.1, 8.1);

    let building = process_building(&[ground, upper], &ZoningConfig::default()).unwrap();
    assert_eq!(building.floors.len(), 2);
    assert_eq!(building.blueprint.primary.len(), 2);

    let shell_of = |floor: usize| -> Vec<Point2D> {
        let shell = building.floors[floor].result.regions().next().unwrap();
        shell.outer().vertices().to_vec()
    };
    let lower = shell_of(0);
    let upper = shell_of(1);
    assert_eq!(lower.len(), upper.len());
    for (a, b) in lower.iter().zip(&upper) {
        assert!(a.approx_eq(b, 1e-9), "{a:?} != {b:?}");
    }
}

#[test]
fn test_runs_are_deterministic() {
    let mut floor = room_with_shaft(0);
    floor.walls.extend([
        WallInput::line(14.0, 0.0, 14.0, 10.0, WallKind::Partition),
        WallInput::line(30.0, 0.0, 31.0, 0.0, WallKind::Solid),
    ]);
    let config = ZoningConfig::default();

    let run = |floor: FloorInput| {
        let building = process_building(&[floor], &config).unwrap();
        serde_json::to_string(&building).unwrap()
    };
    let first = run(floor.clone());
    let second = run(floor);
    assert_eq!(first, second);
}

#[test]
fn test_curve_simplifier_is_idempotent() {
    let noisy: Vec<Point2D> = (0..40)
        .map(|i| {
            let x = i as f64 * 0.25;
            Point2D::new(x, (x * 1.7).sin() * 0.3 + if i % 3 == 0 { 0.004 } else { 0.0 })
        })
        .collect();
    let once = simplify(&noisy, 0.01);
    let twice = simplify(&once, 0.01);
    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(&twice) {
        assert!(a.approx_eq(b, 0.0));
    }
}

#[test]
fn test_slab_edge_without_wall_becomes_airwall() {
    let mut floor = FloorInput::new(0);
    floor.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    floor.walls.remove(2);
    floor.slabs.push(ring(0.0, 0.0, 10.0, 8.0));

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    assert_eq!(outcome.result.regions().count(), 1);
    assert_eq!(outcome.result.airwalls.len(), 1);
    assert_relative_eq!(outcome.result.airwalls[0].length(), 10.0, epsilon = 1e-9);
}

#[test]
fn test_openings_carve_the_shell() {
    let mut floor = FloorInput::new(0);
    floor.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    floor.openings = vec![
        OpeningInput {
            kind: OpeningKind::Window,
            anchor: Point2D::new(5.0, 0.05),
            width: 1.2,
            wall: None,
        },
        OpeningInput {
            kind: OpeningKind::Door,
            anchor: Point2D::new(2.0, 0.3),
            width: 0.9,
            wall: Some(0),
        },
    ];

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    assert_eq!(outcome.result.glazing.len(), 1);
    assert_relative_eq!(outcome.result.glazing[0].length(), 1.2, epsilon = 1e-9);
    assert_eq!(outcome.result.airwalls.len(), 1);
    let door = outcome.result.airwalls[0];
    assert_relative_eq!(door.length(), 0.9, epsilon = 1e-9);
    assert_relative_eq!(door.midpoint().x, 2.0, epsilon = 1e-9);
    assert_relative_eq!(door.midpoint().y, 0.0, epsilon = 1e-9);
}

#[test]
fn test_small_clusters_are_stray() {
    let mut floor = FloorInput::new(0);
    floor.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    floor.walls.extend([
        WallInput::line(30.0, 0.0, 32.0, 0.0, WallKind::Solid),
        WallInput::line(32.0, 0.0, 32.0, 2.0, WallKind::Solid),
    ]);

    let outcome = process_floor(&floor, &Blueprint::default(), &ZoningConfig::default());
    assert_eq!(outcome.result.strays.len(), 2);
    assert_eq!(outcome.diagnostics.count(AnomalyKind::InsufficientData), 1);
    assert_eq!(outcome.result.blocks.len(), 1);
}

#[test]
fn test_floors_out_of_order() {
    let mut a = FloorInput::new(1);
    a.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    let mut b = FloorInput::new(0);
    b.walls = rect_walls(0.0, 0.0, 10.0, 8.0);
    let err = process_building(&[a, b], &ZoningConfig::default()).unwrap_err();
    match err {
        ZoningError::FloorOrder { previous, found } => assert_eq!((previous, found), (1, 0)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_no_usable_regions_is_fatal() {
    let mut floor = FloorInput::new(0);
    floor.walls = vec![
        WallInput::line(0.0, 0.0, 5.0, 0.0, WallKind::Solid),
        WallInput::line(5.0, 0.0, 5.0, 5.0, WallKind::Solid),
    ];
    let err = process_building(&[floor], &ZoningConfig::default()).unwrap_err();
    assert!(matches!(err, ZoningError::NoUsableRegions { floors: 1 }));
}

#[test]
fn test_invalid_tolerances_are_rejected() {
    let tolerances = Tolerances {
        distance: 0.5,
        grouping: 0.05,
        ..Default::default()
    };
    let config = ZoningConfig::default().with_tolerances(tolerances);
    let err = process_building(&[FloorInput::new(0)], &config).unwrap_err();
    assert!(matches!(err, ZoningError::InvalidConfig(_)));
}
