// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input and output types of a zoning run.

use serde::{Deserialize, Serialize};
use zonelite_planar::{Loop, Point2D, Segment};

use crate::diagnostics::FloorSummary;

/// Wall classification as delivered by the extraction layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WallKind {
    #[default]
    Solid,
    /// Transparent perimeter wall; boundaries along it are glazing.
    Curtain,
    /// Interior partition.
    Partition,
    /// Room-separation line: bounds regions like a wall but is reported as
    /// airwall.
    Separation,
}

/// A wall centerline, possibly a polyline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallInput {
    pub points: Vec<Point2D>,
    #[serde(default)]
    pub kind: WallKind,
}

impl WallInput {
    pub fn new(points: Vec<Point2D>, kind: WallKind) -> Self {
        Self { points, kind }
    }

    /// A straight two-point wall.
    pub fn line(x0: f64, y0: f64, x1: f64, y1: f64, kind: WallKind) -> Self {
        Self::new(vec![Point2D::new(x0, y0), Point2D::new(x1, y1)], kind)
    }
}

/// Opening type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
}

/// A door or window anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningInput {
    pub kind: OpeningKind,
    pub anchor: Point2D,
    pub width: f64,
    /// Index into the floor's `walls` of the host wall, if known.
    #[serde(default)]
    pub wall: Option<usize>,
}

/// Everything the core consumes for one floor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorInput {
    /// Ordinal floor index. Floors are processed in ascending order.
    pub index: usize,
    #[serde(default)]
    pub walls: Vec<WallInput>,
    /// Column footprint rings.
    #[serde(default)]
    pub columns: Vec<Vec<Point2D>>,
    #[serde(default)]
    pub openings: Vec<OpeningInput>,
    /// Floor-slab outline rings.
    #[serde(default)]
    pub slabs: Vec<Vec<Point2D>>,
    /// Explicitly excluded spaces (shafts and the like).
    #[serde(default)]
    pub voids: Vec<Vec<Point2D>>,
}

impl FloorInput {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

/// A detected zone.
///
/// Multiply-connected regions always carry their decomposition into simple
/// tiles, so every polygon that leaves the core is simple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    Simple {
        boundary: Loop,
        label: String,
        is_shell: bool,
    },
    MultiplyConnected {
        outer: Loop,
        holes: Vec<Loop>,
        tiles: Vec<Loop>,
        label: String,
    },
}

impl Region {
    pub fn label(&self) -> &str {
        match self {
            Region::Simple { label, .. } | Region::MultiplyConnected { label, .. } => label,
        }
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, Region::Simple { is_shell: true, .. })
    }

    /// Outer boundary.
    pub fn outer(&self) -> &Loop {
        match self {
            Region::Simple { boundary, .. } => boundary,
            Region::MultiplyConnected { outer, .. } => outer,
        }
    }

    pub fn holes(&self) -> &[Loop] {
        match self {
            Region::Simple { .. } => &[],
            Region::MultiplyConnected { holes, .. } => holes,
        }
    }

    /// The simple polygons that make up the region.
    pub fn simple_loops(&self) -> Vec<&Loop> {
        match self {
            Region::Simple { boundary, .. } => vec![boundary],
            Region::MultiplyConnected { tiles, .. } => tiles.iter().collect(),
        }
    }

    /// Enclosed area, holes excluded.
    pub fn area(&self) -> f64 {
        self.outer().area() - self.holes().iter().map(Loop::area).sum::<f64>()
    }
}

/// One spatial cluster on one floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: usize,
    /// Orthogonal hull of the cluster's segments.
    pub hull: Loop,
    /// Coarse outline traced before alignment.
    pub outline: Loop,
    /// Hulls of nested sub-clusters.
    pub nested: Vec<Loop>,
    /// Number of collinear groups fused in this block.
    pub clusters: usize,
    /// Detected shell, if detection found one.
    pub shell: Option<Loop>,
    pub regions: Vec<Region>,
    /// Segments dropped between clustering and detection.
    pub debris: Vec<Segment>,
}

/// Output for one floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorResult {
    pub index: usize,
    pub blocks: Vec<Block>,
    pub glazing: Vec<Segment>,
    pub airwalls: Vec<Segment>,
    /// Void-room loops, counter-clockwise.
    pub voids: Vec<Loop>,
    /// Segments of clusters too small to detect.
    pub strays: Vec<Segment>,
    pub summary: FloorSummary,
}

impl FloorResult {
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.blocks.iter().flat_map(|b| b.regions.iter())
    }

    pub fn shells(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.blocks.iter().filter_map(|b| b.shell.as_ref())
    }
}
