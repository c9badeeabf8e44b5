// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Zonelite Zoning
//!
//! Turns tolerance-noisy 2D wall segments of a building floor plate into
//! closed zone polygons: a shell per block, simple rooms, and rooms with holes
//! decomposed into simple tiles.
//!
//! ```text
//! walls -> fuse -> extend -> align -> lattice -> detect -> tessellate -> regions
//!                              ^                                            |
//!                              +---------------- blueprint <----------------+
//! ```
//!
//! Floors are processed in ascending order with [`process_building`]; each
//! floor's [`Blueprint`] of grid lines is handed to the next so that walls on
//! stacked floors stay aligned. Recoverable anomalies never abort a run; they
//! are collected in [`Diagnostics`].

pub mod align;
pub mod cluster;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod extend;
pub mod perimeter;
pub mod pipeline;
pub mod tessellate;
pub mod types;

pub use align::{align_points, get_lattice, Blueprint, JointGraph, Lattice};
pub use cluster::{fuse, fuse_collinear, overlap_clusters, partition_blocks, DisjointSet};
pub use config::ZoningConfig;
pub use detect::{detect_regions, get_shell, Detection};
pub use diagnostics::{Anomaly, AnomalyKind, BlockSummary, Diagnostics, FloorSummary, Geometry};
pub use error::{Result, ZoningError};
pub use extend::{close_corners, extend_line, node_segments, snap_t_junctions};
pub use pipeline::{process_building, process_floor, BuildingResult, FloorOutcome};
pub use tessellate::{assign_holes, split_holes};
pub use types::{
    Block, FloorInput, FloorResult, OpeningInput, OpeningKind, Region, WallInput, WallKind,
};

pub use zonelite_planar as planar;
