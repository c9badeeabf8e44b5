// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment clustering and fusion.
//!
//! Two independent groupings live here:
//!
//! - **Overlap clusters**: transitive closure of "collinear and overlapping
//!   within `grouping`". Each cluster is fused into one representative segment.
//! - **Spatial clusters** (blocks): transitive closure of "bodies within
//!   `alignment`". Small clusters are stray; clusters whose hull sits inside a
//!   larger hull are nested into that block.
//!
//! Both are union-find over segment indices with an explicit predicate.

use tracing::debug;
use zonelite_planar::{ortho_hull_of_segments, Loop, Segment, Tolerances};

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    /// Merge the sets of `x` and `y`. Returns false if already joined.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return false;
        }
        if self.rank[rx] < self.rank[ry] {
            self.parent[rx] = ry;
        } else if self.rank[rx] > self.rank[ry] {
            self.parent[ry] = rx;
        } else {
            self.parent[ry] = rx;
            self.rank[rx] += 1;
        }
        true
    }

    /// All sets, each sorted ascending, ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut slot = vec![usize::MAX; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = self.find(i);
            if slot[root] == usize::MAX {
                slot[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot[root]].push(i);
        }
        groups
    }
}

/// Group segments that are collinear and overlap or nearly overlap.
///
/// Parallel segments that are offset from each other are never grouped, no
/// matter how close.
pub fn overlap_clusters(segments: &[Segment], tol: &Tolerances) -> Vec<Vec<usize>> {
    let mut sets = DisjointSet::new(segments.len());
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if segments[i].overlaps(&segments[j], tol) {
                sets.union(i, j);
            }
        }
    }
    sets.groups()
}

/// Collapse a cluster into one segment spanning its extreme projections.
///
/// The result lies on the longest member's line and keeps its direction.
pub fn fuse(cluster: &[Segment]) -> Option<Segment> {
    let longest = cluster
        .iter()
        .max_by(|a, b| a.length().total_cmp(&b.length()))?;
    let dir = longest.unit()?;

    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for s in cluster {
        for p in [s.start, s.end] {
            let t = longest.start.vector_to(&p).dot(&dir);
            lo = lo.min(t);
            hi = hi.max(t);
        }
    }
    Some(Segment::new(
        longest.start.offset(&(dir * lo)),
        longest.start.offset(&(dir * hi)),
    ))
}

/// Cluster and fuse. Returns the fused segments and the number of clusters
/// that actually merged more than one segment.
pub fn fuse_collinear(segments: &[Segment], tol: &Tolerances) -> (Vec<Segment>, usize) {
    let clusters = overlap_clusters(segments, tol);
    let merged = clusters.iter().filter(|c| c.len() > 1).count();
    let fused = clusters
        .iter()
        .filter_map(|members| {
            let group: Vec<Segment> = members.iter().map(|&i| segments[i]).collect();
            fuse(&group)
        })
        .collect();
    (fused, merged)
}

/// One spatial cluster that bounds regions.
#[derive(Debug, Clone)]
pub struct BlockCluster {
    /// Segment indices, nested sub-clusters included.
    pub members: Vec<usize>,
    pub hull: Loop,
    /// Hulls of the sub-clusters nested into this block.
    pub nested: Vec<Loop>,
}

/// Result of splitting a floor into blocks.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub blocks: Vec<BlockCluster>,
    /// Clusters with too few segments, as index lists.
    pub strays: Vec<Vec<usize>>,
}

/// Split a floor's segments into blocks.
///
/// Clusters with `min_segments` segments or fewer are stray. The rest are
/// ranked by hull area; a cluster whose hull lies inside an earlier block's
/// hull is nested into that block. Blocks are returned ordered by the
/// lowest-then-leftmost hull vertex.
pub fn partition_blocks(segments: &[Segment], min_segments: usize, tol: &Tolerances) -> Partition {
    let mut sets = DisjointSet::new(segments.len());
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if segments[i].distance_to_segment(&segments[j]) <= tol.alignment {
                sets.union(i, j);
            }
        }
    }

    let mut partition = Partition::default();
    let mut candidates: Vec<(Vec<usize>, Loop)> = Vec::new();
    for members in sets.groups() {
        if members.len() <= min_segments {
            partition.strays.push(members);
            continue;
        }
        let group: Vec<Segment> = members.iter().map(|&i| segments[i]).collect();
        match ortho_hull_of_segments(&group, tol) {
            Ok(hull) => candidates.push((members, hull)),
            Err(_) => partition.strays.push(members),
        }
    }
    candidates.sort_by(|a, b| b.1.area().total_cmp(&a.1.area()));

    for (members, hull) in candidates {
        let host = partition
            .blocks
            .iter_mut()
            .find(|block| block.hull.contains_loop(&hull, tol.distance));
        match host {
            Some(block) => {
                block.members.extend(members);
                block.members.sort_unstable();
                block.nested.push(hull);
            }
            None => partition.blocks.push(BlockCluster {
                members,
                hull,
                nested: Vec::new(),
            }),
        }
    }
    partition
        .blocks
        .sort_by(|a, b| a.hull.first().cmp_yx(&b.hull.first()));

    debug!(
        blocks = partition.blocks.len(),
        strays = partition.strays.len(),
        "partitioned segments into blocks"
    );
    partition
}
