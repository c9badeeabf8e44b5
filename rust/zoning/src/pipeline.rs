// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor and building drivers.
//!
//! A floor runs: wall preparation → perimeter patching → block partition, and
//! then per block: fuse → close corners → snap T-junctions → node → outline →
//! align (both axes) → lattice → detect → holes → labels. Floors run strictly
//! in order because each one aligns against the blueprint of the floors
//! below.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};
use zonelite_planar::{simplify, Location, Loop, Point2D, Segment, Tolerances};

use crate::align::{align_points, get_lattice, Blueprint, JointGraph};
use crate::cluster::{fuse_collinear, partition_blocks, BlockCluster};
use crate::config::ZoningConfig;
use crate::detect::{detect_regions, get_shell, Face};
use crate::diagnostics::{AnomalyKind, BlockSummary, Diagnostics, FloorSummary, Geometry};
use crate::error::{Result, ZoningError};
use crate::extend::{close_corners, node_segments, snap_t_junctions};
use crate::perimeter::{carve_openings, classify_edges, patch_columns, patch_slabs, unique_edges};
use crate::tessellate::{assign_holes, split_holes};
use crate::types::{Block, FloorInput, FloorResult, Region, WallKind};

/// Turn-angle epsilon for loop normalisation.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// Everything one floor produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorOutcome {
    pub result: FloorResult,
    pub diagnostics: Diagnostics,
    /// Blueprint to align the next floor against.
    pub blueprint: Blueprint,
}

impl FloorOutcome {
    /// At least one region or shell was found.
    fn is_usable(&self) -> bool {
        let result = &self.result;
        result.regions().next().is_some() || result.shells().next().is_some()
    }
}

/// All floors of a building, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingResult {
    pub floors: Vec<FloorOutcome>,
    /// Blueprint after the last floor.
    pub blueprint: Blueprint,
}

impl BuildingResult {
    pub fn region_count(&self) -> usize {
        self.floors.iter().map(|f| f.result.regions().count()).sum()
    }
}

/// Wall segments split by role.
#[derive(Default)]
struct PreparedWalls {
    /// Every segment that bounds regions.
    all: Vec<Segment>,
    curtains: Vec<Segment>,
    separations: Vec<Segment>,
}

fn prepare_walls(input: &FloorInput, tol: &Tolerances, diag: &mut Diagnostics) -> PreparedWalls {
    let mut walls = PreparedWalls::default();
    for wall in &input.walls {
        let points = simplify(&wall.points, tol.distance);
        if points.len() < 2 {
            if let Some(p) = wall.points.first() {
                diag.record(
                    AnomalyKind::GeometricDegeneracy,
                    Geometry::Point(*p),
                    "wall polyline has fewer than two points",
                );
            }
            continue;
        }
        for pair in points.windows(2) {
            let segment = match Segment::checked(pair[0], pair[1], tol) {
                Ok(segment) => segment,
                Err(err) => {
                    diag.record(
                        AnomalyKind::GeometricDegeneracy,
                        Geometry::Segment(Segment::new(pair[0], pair[1])),
                        format!("wall dropped: {err}"),
                    );
                    continue;
                }
            };
            match wall.kind {
                WallKind::Curtain => walls.curtains.push(segment),
                WallKind::Separation => walls.separations.push(segment),
                WallKind::Solid | WallKind::Partition => {}
            }
            walls.all.push(segment);
        }
    }
    walls
}

/// Closed, normalised loops from input rings; degenerate rings are recorded
/// and dropped.
fn input_loops(
    rings: &[Vec<Point2D>],
    what: &str,
    tol: &Tolerances,
    diag: &mut Diagnostics,
) -> Vec<Loop> {
    rings
        .iter()
        .filter_map(|ring| match Loop::from_points(ring, tol) {
            Ok(l) => Some(l.normalized(STRAIGHT_EPSILON)),
            Err(err) => {
                diag.record(
                    AnomalyKind::GeometricDegeneracy,
                    Geometry::Ring(ring.clone()),
                    format!("{what} outline dropped: {err}"),
                );
                None
            }
        })
        .collect()
}

/// Process one floor against the blueprint of the floors below.
///
/// Never fails: every anomaly is recovered and recorded in the returned
/// diagnostics.
pub fn process_floor(
    input: &FloorInput,
    blueprint: &Blueprint,
    config: &ZoningConfig,
) -> FloorOutcome {
    let span = info_span!("floor", floor = input.index);
    let _enter = span.enter();
    let start = Instant::now();
    let tol = &config.tolerances;
    let mut diag = Diagnostics::new(input.index);

    let mut walls = prepare_walls(input, tol, &mut diag);
    let columns = input_loops(&input.columns, "column", tol, &mut diag);
    let slabs = input_loops(&input.slabs, "slab", tol, &mut diag);
    let voids = input_loops(&input.voids, "void", tol, &mut diag);

    let slab_patches = patch_slabs(&walls.all, &slabs, tol);
    walls.separations.extend(slab_patches.iter().copied());
    walls.all.extend(slab_patches);
    patch_columns(&mut walls.all, &columns, tol, &mut diag);

    let partition = partition_blocks(&walls.all, config.min_cluster_segments, tol);
    let mut strays = Vec::new();
    for members in &partition.strays {
        let segments: Vec<Segment> = members.iter().map(|&i| walls.all[i]).collect();
        let count = segments.len();
        diag.record(
            AnomalyKind::InsufficientData,
            Geometry::Segments(segments.clone()),
            format!("cluster of {count} segment(s) cannot bound a region"),
        );
        strays.extend(segments);
    }

    let mut summary = FloorSummary {
        floor: input.index,
        strays: strays.len(),
        ..Default::default()
    };
    let mut blocks = Vec::with_capacity(partition.blocks.len());
    let mut next = Blueprint::default();
    let mut voided = 0;
    for (b, cluster) in partition.blocks.iter().enumerate() {
        diag.set_block(Some(b));
        let run = BlockRun {
            floor: input.index,
            index: b,
            walls: &walls.all,
            voids: &voids,
            blueprint,
            config,
        };
        let (block, block_next, block_summary, removed) = run.process(cluster, &mut diag);
        next.merge(&block_next, tol);
        voided += removed;
        summary.push_block(block_summary);
        blocks.push(block);
    }
    diag.set_block(None);
    if partition.blocks.is_empty() {
        next = blueprint.clone();
    }

    let boundaries = unique_edges(
        blocks
            .iter()
            .flat_map(|b| &b.regions)
            .flat_map(|r| std::iter::once(r.outer()).chain(r.holes())),
        tol,
    );
    let mut glazing = classify_edges(&boundaries, &walls.curtains, tol);
    let mut airwalls = classify_edges(&boundaries, &walls.separations, tol);

    let perimeter: Vec<Segment> = blocks
        .iter()
        .flat_map(|b| b.shell.as_ref().unwrap_or(&b.outline).edges())
        .collect();
    let carved = carve_openings(&input.openings, &input.walls, &perimeter, tol);
    glazing.extend(carved.glazing);
    airwalls.extend(carved.airwalls);

    summary.voids = voided;
    summary.anomalies = diag.len();
    info!(
        blocks = blocks.len(),
        regions = summary.regions,
        strays = summary.strays,
        anomalies = summary.anomalies,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "floor processed"
    );

    FloorOutcome {
        result: FloorResult {
            index: input.index,
            blocks,
            glazing,
            airwalls,
            voids,
            strays,
            summary,
        },
        diagnostics: diag,
        blueprint: next,
    }
}

/// Shared context for processing one block.
struct BlockRun<'a> {
    floor: usize,
    index: usize,
    walls: &'a [Segment],
    voids: &'a [Loop],
    blueprint: &'a Blueprint,
    config: &'a ZoningConfig,
}

impl BlockRun<'_> {
    fn label(&self, suffix: &str) -> String {
        let prefix = &self.config.label_prefix;
        format!("{prefix}F{}-B{}-{suffix}", self.floor, self.index)
    }

    /// Drop rooms that fall outside `shell`, are too small or sit inside a
    /// void. Returns the kept rooms and the number of voided ones.
    fn keep_rooms(
        &self,
        faces: &[Face],
        shell: Option<&Loop>,
        diag: &mut Diagnostics,
    ) -> (Vec<Loop>, usize) {
        let tol = &self.config.tolerances;
        let mut rooms: Vec<Loop> = Vec::new();
        let mut voided = 0;
        for face in faces {
            let room = face.boundary.normalized(STRAIGHT_EPSILON);
            if let Some(shell) = shell {
                if !shell.contains_loop(&room, tol.distance) {
                    diag.record(
                        AnomalyKind::OutsideShell,
                        Geometry::Ring(room.points().to_vec()),
                        "region lies outside its block shell",
                    );
                    continue;
                }
            }
            if room.area() < self.config.min_region_area {
                diag.record(
                    AnomalyKind::Debris,
                    Geometry::Ring(room.points().to_vec()),
                    format!("region area {:.4} below minimum", room.area()),
                );
                continue;
            }
            let inner = room.interior_point();
            if self.voids.iter().any(|v| v.locate(&inner, 0.0) == Location::Inside) {
                debug!(x = inner.x, y = inner.y, "room falls inside a void");
                voided += 1;
                continue;
            }
            rooms.push(room);
        }
        (rooms, voided)
    }

    /// Returns the block, its blueprint contribution, its summary and the
    /// number of rooms removed as voids.
    fn process(
        &self,
        cluster: &BlockCluster,
        diag: &mut Diagnostics,
    ) -> (Block, Blueprint, BlockSummary, usize) {
        let span = info_span!("block", block = self.index);
        let _enter = span.enter();
        let tol = &self.config.tolerances;

        let segments: Vec<Segment> = cluster.members.iter().map(|&i| self.walls[i]).collect();
        let (fused, clusters) = fuse_collinear(&segments, tol);
        let mut closed = close_corners(&fused, tol, diag);
        snap_t_junctions(&mut closed, tol);
        let noded = node_segments(&closed, tol);
        let outline = get_shell(&noded, tol)
            .map(|l| l.normalized(STRAIGHT_EPSILON))
            .unwrap_or_else(|_| cluster.hull.clone());

        let (mut graph, mut debris) = JointGraph::from_segments(&noded, tol);
        let primary = align_points(
            &mut graph,
            self.config.reference_angle,
            &self.blueprint.primary,
            tol,
        );
        let secondary = align_points(
            &mut graph,
            self.config.secondary_angle(),
            &self.blueprint.secondary,
            tol,
        );
        let lattice = get_lattice(&graph, tol);
        debris.extend(lattice.debris);
        for segment in &debris {
            diag.record(
                AnomalyKind::Debris,
                Geometry::Segment(*segment),
                "segment collapsed or left dangling after alignment",
            );
        }

        let detection = detect_regions(&lattice.graph, tol, diag);
        for bridge in &detection.bridges {
            diag.record(
                AnomalyKind::Debris,
                Geometry::Segment(*bridge),
                "bridge edge does not separate two regions",
            );
        }
        debris.extend(detection.bridges.iter().copied());

        let shell = match detection.shell {
            Some(shell) => Some(shell.normalized(STRAIGHT_EPSILON)),
            None if !detection.rooms.is_empty() => Some(outline.clone()),
            None => None,
        };

        let (rooms, voided) = self.keep_rooms(&detection.rooms, shell.as_ref(), diag);

        let candidates: Vec<Loop> = detection
            .islands
            .iter()
            .map(|f| f.boundary.normalized(STRAIGHT_EPSILON))
            .collect();
        let owners = assign_holes(&rooms, &candidates, tol);
        let mut holes_of: Vec<Vec<Loop>> = vec![Vec::new(); rooms.len()];
        for (hole, owner) in candidates.into_iter().zip(owners) {
            if let Some(room) = owner {
                holes_of[room].push(hole);
            }
        }

        let mut entries: Vec<(Loop, Vec<Loop>)> = rooms.into_iter().zip(holes_of).collect();
        entries.sort_by(|a, b| a.0.first().cmp_yx(&b.0.first()));

        let mut summary = BlockSummary {
            block: self.index,
            clusters,
            nested: cluster.nested.len(),
            debris: debris.len(),
            ..Default::default()
        };
        let mut regions = Vec::with_capacity(entries.len() + 1);
        let single_room_is_shell = match (&shell, entries.as_slice()) {
            (Some(shell), [(room, holes)]) => holes.is_empty() && coincide(shell, room, tol),
            _ => false,
        };
        if let Some(shell) = &shell {
            regions.push(Region::Simple {
                boundary: shell.clone(),
                label: self.label("SHELL"),
                is_shell: true,
            });
        }
        if !single_room_is_shell {
            for (n, (outer, holes)) in entries.into_iter().enumerate() {
                let label = self.label(&format!("R{}", n + 1));
                if holes.is_empty() {
                    regions.push(Region::Simple {
                        boundary: outer,
                        label,
                        is_shell: false,
                    });
                } else {
                    let tiles = split_holes(&outer, &holes, tol);
                    summary.holes += holes.len();
                    summary.tiles += tiles.len();
                    regions.push(Region::MultiplyConnected {
                        outer,
                        holes,
                        tiles,
                        label,
                    });
                }
            }
        }
        summary.regions = regions.len();

        let next = Blueprint {
            primary: primary.next,
            secondary: secondary.next,
        };
        debug!(%summary, "block processed");

        (
            Block {
                index: self.index,
                hull: cluster.hull.clone(),
                outline,
                nested: cluster.nested.clone(),
                clusters,
                shell,
                regions,
                debris,
            },
            next,
            summary,
            voided,
        )
    }
}

/// Two loops enclose the same area.
fn coincide(a: &Loop, b: &Loop, tol: &Tolerances) -> bool {
    (a.area() - b.area()).abs() <= tol.min_area().max(a.area() * 1e-9)
        && a.contains_loop(b, tol.distance)
        && b.contains_loop(a, tol.distance)
}

/// Process every floor in ascending order, threading the blueprint from each
/// floor into the next.
///
/// Fails when the configuration is invalid, when floors are out of order, or
/// when not a single region or shell was found on any floor.
pub fn process_building(floors: &[FloorInput], config: &ZoningConfig) -> Result<BuildingResult> {
    config.validate()?;
    if let Some(pair) = floors.windows(2).find(|p| p[1].index <= p[0].index) {
        return Err(ZoningError::FloorOrder {
            previous: pair[0].index,
            found: pair[1].index,
        });
    }

    let span = info_span!("building", floors = floors.len());
    let _enter = span.enter();

    let mut blueprint = Blueprint::default();
    let mut outcomes = Vec::with_capacity(floors.len());
    for floor in floors {
        let outcome = process_floor(floor, &blueprint, config);
        debug!(summary = %outcome.result.summary, "floor summary");
        blueprint = outcome.blueprint.clone();
        outcomes.push(outcome);
    }

    if !outcomes.iter().any(FloorOutcome::is_usable) {
        return Err(ZoningError::NoUsableRegions {
            floors: floors.len(),
        });
    }
    Ok(BuildingResult {
        floors: outcomes,
        blueprint,
    })
}
