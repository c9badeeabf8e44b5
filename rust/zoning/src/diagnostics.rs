// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured log of recovered anomalies, plus the per-floor summary.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zonelite_planar::{Point2D, Segment};

/// Recovered, non-fatal anomaly classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Zero or near-zero length segment or loop, filtered.
    GeometricDegeneracy,
    /// An expected line intersection failed (parallel lines); the pair was
    /// skipped.
    UnresolvedIntersection,
    /// A traced face with no area or a self-touching boundary.
    DetectionFailure,
    /// A cluster too small to bound a region.
    InsufficientData,
    /// Segments that collapsed or dangled after alignment, and regions below
    /// the minimum area.
    Debris,
    /// A candidate region outside its block's shell.
    OutsideShell,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyKind::GeometricDegeneracy => "geometric degeneracy",
            AnomalyKind::UnresolvedIntersection => "unresolved intersection",
            AnomalyKind::DetectionFailure => "detection failure",
            AnomalyKind::InsufficientData => "insufficient data",
            AnomalyKind::Debris => "debris",
            AnomalyKind::OutsideShell => "outside shell",
        };
        f.write_str(name)
    }
}

/// The geometry an anomaly refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Point(Point2D),
    Segment(Segment),
    Segments(Vec<Segment>),
    Ring(Vec<Point2D>),
}

/// One recovered anomaly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub floor: usize,
    pub block: Option<usize>,
    pub kind: AnomalyKind,
    pub message: String,
    pub geometry: Geometry,
}

/// Anomaly log for one floor.
///
/// Records are tagged with the floor and the block currently being processed.
/// Every record is also emitted as a `tracing` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    floor: usize,
    #[serde(skip)]
    block: Option<usize>,
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn new(floor: usize) -> Self {
        Self {
            floor,
            block: None,
            anomalies: Vec::new(),
        }
    }

    /// Tag subsequent records with `block` (`None` for floor-level stages).
    pub fn set_block(&mut self, block: Option<usize>) {
        self.block = block;
    }

    pub fn record(&mut self, kind: AnomalyKind, geometry: Geometry, message: impl Into<String>) {
        let message = message.into();
        match kind {
            AnomalyKind::GeometricDegeneracy => {
                debug!(floor = self.floor, block = ?self.block, %kind, "{message}")
            }
            _ => warn!(floor = self.floor, block = ?self.block, %kind, "{message}"),
        }
        self.anomalies.push(Anomaly {
            floor: self.floor,
            block: self.block,
            kind,
            message,
            geometry,
        });
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.anomalies.iter().filter(|a| a.kind == kind).count()
    }

    /// Records tagged with `block`.
    pub fn for_block(&self, block: usize) -> impl Iterator<Item = &Anomaly> + '_ {
        self.anomalies
            .iter()
            .filter(move |a| a.block == Some(block))
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Counts for one block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSummary {
    pub block: usize,
    pub clusters: usize,
    pub nested: usize,
    pub regions: usize,
    pub holes: usize,
    pub tiles: usize,
    pub debris: usize,
}

/// Counts for one floor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorSummary {
    pub floor: usize,
    pub blocks: Vec<BlockSummary>,
    pub clusters: usize,
    pub strays: usize,
    pub regions: usize,
    pub holes: usize,
    pub tiles: usize,
    pub debris: usize,
    /// Regions removed because they fall inside a void loop.
    pub voids: usize,
    pub anomalies: usize,
}

impl FloorSummary {
    /// Add one block's counts to the floor totals.
    pub fn push_block(&mut self, block: BlockSummary) {
        self.clusters += block.clusters;
        self.regions += block.regions;
        self.holes += block.holes;
        self.tiles += block.tiles;
        self.debris += block.debris;
        self.blocks.push(block);
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {}: {} cluster(s), {} nested, {} region(s), {} hole(s), {} tile(s), {} debris",
            self.block,
            self.clusters,
            self.nested,
            self.regions,
            self.holes,
            self.tiles,
            self.debris
        )
    }
}

impl fmt::Display for FloorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "floor {}: {} block(s), {} cluster(s), {} stray(s), {} region(s), {} hole(s), \
             {} tile(s), {} debris, {} void room(s) removed, {} anomaly record(s)",
            self.floor,
            self.blocks.len(),
            self.clusters,
            self.strays,
            self.regions,
            self.holes,
            self.tiles,
            self.debris,
            self.voids,
            self.anomalies
        )?;
        for block in &self.blocks {
            writeln!(f, "  {block}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tags_block() {
        let mut diag = Diagnostics::new(3);
        diag.record(
            AnomalyKind::GeometricDegeneracy,
            Geometry::Point(Point2D::new(0.0, 0.0)),
            "zero-length wall",
        );
        diag.set_block(Some(1));
        diag.record(
            AnomalyKind::Debris,
            Geometry::Segment(Segment::from_coords(0.0, 0.0, 1.0, 0.0)),
            "dangling",
        );
        assert_eq!(diag.len(), 2);
        assert_eq!(diag.anomalies()[0].block, None);
        assert_eq!(diag.for_block(1).count(), 1);
        assert_eq!(diag.count(AnomalyKind::Debris), 1);
        assert_eq!(diag.anomalies()[1].floor, 3);
    }

    #[test]
    fn test_summary_display() {
        let mut summary = FloorSummary {
            floor: 0,
            ..Default::default()
        };
        summary.push_block(BlockSummary {
            block: 0,
            clusters: 4,
            regions: 2,
            ..Default::default()
        });
        let text = summary.to_string();
        assert!(text.starts_with("floor 0: 1 block(s), 4 cluster(s)"));
        let block_line = "  block 0: 4 cluster(s), 0 nested, 2 region(s)";
        assert!(text.contains(block_line));
    }
}
