// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extending, trimming and splitting segments so that walls that are meant to
//! meet actually intersect.

use tracing::debug;
use zonelite_planar::{End, Result, Segment, Tolerances};

use crate::cluster::fuse;
use crate::diagnostics::{AnomalyKind, Diagnostics, Geometry};

/// Extend `a` along its own direction to the line of `b`.
///
/// The endpoint of `a` nearer to the intersection moves onto it and the far
/// endpoint stays put. When the intersection already lies inside `a`'s span
/// this trims the overshoot instead; when `a` already ends on `b`'s line it is
/// returned unchanged. Fails with `ParallelLines` for parallel lines.
pub fn extend_line(a: &Segment, b: &Segment, angle_tolerance: f64) -> Result<Segment> {
    let p = a.line_intersection(b, angle_tolerance)?;
    let near = if a.param_of(&p) >= 0.5 {
        End::End
    } else {
        End::Start
    };
    Ok(a.with_endpoint(near, p))
}

/// Close corner gaps between "almost joined" segments.
///
/// Collinear near-misses are fused into one segment. Other pairs are both
/// extended to their common intersection. Pairs whose lines are parallel are
/// left alone and recorded.
pub fn close_corners(
    segments: &[Segment],
    tol: &Tolerances,
    diag: &mut Diagnostics,
) -> Vec<Segment> {
    let mut work: Vec<Option<Segment>> = segments.iter().copied().map(Some).collect();
    let mut closed = 0usize;

    for i in 0..work.len() {
        for j in (i + 1)..work.len() {
            let (Some(a), Some(b)) = (work[i], work[j]) else {
                continue;
            };
            if a.almost_joined(&b, tol).is_none() {
                continue;
            }

            if a.is_collinear(&b, tol) {
                if let Some(fused) = fuse(&[a, b]) {
                    work[i] = Some(fused);
                    work[j] = None;
                    closed += 1;
                }
                continue;
            }

            match (extend_line(&a, &b, tol.angle), extend_line(&b, &a, tol.angle)) {
                (Ok(a2), Ok(b2)) => {
                    work[i] = Some(a2);
                    work[j] = Some(b2);
                    closed += 1;
                }
                _ => diag.record(
                    AnomalyKind::UnresolvedIntersection,
                    Geometry::Segments(vec![a, b]),
                    "corner gap between near-parallel walls left open",
                ),
            }
        }
    }

    debug!(closed, "closed corner gaps");
    work.into_iter().flatten().collect()
}

/// Snap endpoints that stop short of, or overshoot, another segment's body by
/// less than `grouping`.
///
/// The endpoint moves along its own segment onto the other line. Among
/// several candidates the nearest wins. Returns the number of snapped ends.
pub fn snap_t_junctions(segments: &mut [Segment], tol: &Tolerances) -> usize {
    let mut snapped = 0;
    for i in 0..segments.len() {
        for end in [End::Start, End::End] {
            let endpoint = segments[i].endpoint(end);
            let mut best: Option<(f64, Segment)> = None;

            for j in 0..segments.len() {
                if i == j || segments[i].is_parallel(&segments[j], tol.angle) {
                    continue;
                }
                let other = &segments[j];
                if other.distance_to_point(&endpoint) > tol.grouping {
                    continue;
                }
                let Some((t, u)) = segments[i].line_params(other) else {
                    continue;
                };
                // Target must sit on (or within grouping of) the other body.
                let slack = tol.grouping / other.length().max(f64::EPSILON);
                if u < -slack || u > 1.0 + slack {
                    continue;
                }
                let target = segments[i].point_at(t);
                let shift = target.distance_to(&endpoint);
                if shift < 1e-12 || shift > tol.grouping {
                    continue;
                }
                let candidate = segments[i].with_endpoint(end, target);
                if candidate.is_degenerate(tol) {
                    continue;
                }
                if best.as_ref().map_or(true, |(d, _)| shift < *d) {
                    best = Some((shift, candidate));
                }
            }

            if let Some((_, candidate)) = best {
                segments[i] = candidate;
                snapped += 1;
            }
        }
    }
    debug!(snapped, "snapped T-junctions");
    snapped
}

/// Split every segment at every point where another segment crosses or
/// touches it, so the result is a planar straight-line graph.
///
/// Pieces shorter than `distance` are dropped. Exact duplicates (from
/// overlapping input) are kept; joint clustering merges them later.
pub fn node_segments(segments: &[Segment], tol: &Tolerances) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len() * 2);
    for (i, s) in segments.iter().enumerate() {
        let len = s.length();
        if len < tol.distance {
            continue;
        }
        let mut cuts: Vec<f64> = vec![0.0, 1.0];
        for (j, other) in segments.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(p) = s.intersection(other, 0.0) {
                cuts.push(s.param_of(&p));
            }
            // Endpoints resting on the body (T-junctions and collinear overlap).
            for p in [other.start, other.end] {
                if s.distance_to_point(&p) <= tol.distance {
                    cuts.push(s.param_of(&p));
                }
            }
        }

        let min_t = tol.distance / len;
        let mut inner: Vec<f64> = cuts
            .into_iter()
            .filter(|&t| t > min_t && t < 1.0 - min_t)
            .collect();
        inner.sort_by(f64::total_cmp);
        inner.dedup_by(|a, b| (*a - *b) * len < tol.distance);

        let mut prev = s.start;
        for t in inner {
            let p = s.point_at(t);
            out.push(Segment::new(prev, p));
            prev = p;
        }
        out.push(Segment::new(prev, s.end));
    }
    out.retain(|s| !s.is_degenerate(tol));
    out
}
