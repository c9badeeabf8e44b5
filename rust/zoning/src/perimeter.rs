// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perimeter patching: columns, slab edges, openings and boundary
//! classification.
//!
//! Everything here works with the `perimeter_offset` reach, which is larger
//! than the alignment tolerance: walls stop at a column face, not its center,
//! and wall centerlines sit half a wall thickness inside the slab edge.

use tracing::debug;
use zonelite_planar::{End, Location, Loop, Point2D, Segment, Tolerances};

use crate::diagnostics::{AnomalyKind, Diagnostics, Geometry};
use crate::extend::extend_line;
use crate::types::{OpeningInput, OpeningKind, WallInput};

/// Reconnect walls that stop at a column.
///
/// A wall end lies "at" a column when it is inside the footprint grown by
/// `perimeter_offset`. Ends at the same column are paired nearest first:
/// collinear walls get a bridging segment across the column, other pairs are
/// both extended to their intersection when it falls inside the grown
/// footprint. An end left without a partner is extended along its own line
/// onto a wall whose body crosses the column. Walls that pass through a
/// column are not touched, and column outlines themselves never become
/// segments.
pub fn patch_columns(
    segments: &mut Vec<Segment>,
    columns: &[Loop],
    tol: &Tolerances,
    diag: &mut Diagnostics,
) -> usize {
    let mut patched = 0;
    for column in columns {
        let at_column = |p: &Point2D| column.locate(p, tol.perimeter_offset) != Location::Outside;

        let ends: Vec<(usize, End)> = (0..segments.len())
            .flat_map(|i| [(i, End::Start), (i, End::End)])
            .filter(|&(i, end)| at_column(&segments[i].endpoint(end)))
            .collect();
        if ends.is_empty() {
            continue;
        }

        let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
        for a in 0..ends.len() {
            for b in (a + 1)..ends.len() {
                if ends[a].0 == ends[b].0 {
                    continue;
                }
                let pa = segments[ends[a].0].endpoint(ends[a].1);
                let pb = segments[ends[b].0].endpoint(ends[b].1);
                pairs.push((pa.distance_to(&pb), a, b));
            }
        }
        pairs.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut used = vec![false; ends.len()];
        let mut bridges = Vec::new();
        for (_, a, b) in pairs {
            if used[a] || used[b] {
                continue;
            }
            let (ia, ea) = ends[a];
            let (ib, eb) = ends[b];
            let sa = segments[ia];
            let sb = segments[ib];
            let pa = sa.endpoint(ea);
            let pb = sb.endpoint(eb);

            if sa.is_collinear(&sb, tol) {
                if !pa.approx_eq(&pb, tol.distance) {
                    bridges.push(Segment::new(pa, pb));
                }
            } else {
                match sa.line_intersection(&sb, tol.angle) {
                    Ok(p) if at_column(&p) => {
                        segments[ia] = sa.with_endpoint(ea, p);
                        segments[ib] = sb.with_endpoint(eb, p);
                    }
                    Ok(_) => continue,
                    Err(_) => {
                        diag.record(
                            AnomalyKind::UnresolvedIntersection,
                            Geometry::Segments(vec![sa, sb]),
                            "walls at a column are parallel but not collinear",
                        );
                        continue;
                    }
                }
            }
            used[a] = true;
            used[b] = true;
            patched += 1;
        }

        for (k, &(i, end)) in ends.iter().enumerate() {
            if used[k] {
                continue;
            }
            if let Some(extended) = extend_onto_crossing(segments, i, end, &at_column, tol) {
                segments[i] = extended;
                patched += 1;
            }
        }
        segments.extend(bridges);
    }
    debug!(patched, columns = columns.len(), "patched walls at columns");
    patched
}

/// Extend end `end` of `segments[index]` onto the nearest non-parallel wall
/// whose body meets its line at the column.
fn extend_onto_crossing<F>(
    segments: &[Segment],
    index: usize,
    end: End,
    at_column: &F,
    tol: &Tolerances,
) -> Option<Segment>
where
    F: Fn(&Point2D) -> bool,
{
    let wall = segments[index];
    let endpoint = wall.endpoint(end);
    let mut best: Option<(f64, Segment)> = None;
    for (j, other) in segments.iter().enumerate() {
        if j == index || wall.is_parallel(other, tol.angle) {
            continue;
        }
        let Some((_, u)) = wall.line_params(other) else {
            continue;
        };
        let slack = tol.distance / other.length().max(f64::EPSILON);
        if u < -slack || u > 1.0 + slack {
            continue;
        }
        let Ok(extended) = extend_line(&wall, other, tol.angle) else {
            continue;
        };
        let target = extended.endpoint(end);
        let far = extended.endpoint(end.other());
        let shift = target.distance_to(&endpoint);
        // extend_line moved the other end, or the end already sits on the wall.
        if !far.approx_eq(&wall.endpoint(end.other()), 1e-12)
            || shift < tol.distance
            || !at_column(&target)
            || extended.is_degenerate(tol)
        {
            continue;
        }
        if best.as_ref().map_or(true, |(d, _)| shift < *d) {
            best = Some((shift, extended));
        }
    }
    best.map(|(_, extended)| extended)
}

/// Separation segments along slab edges that no wall covers.
///
/// A wall covers a slab edge where it runs parallel to it within
/// `perimeter_offset`. Uncovered stretches longer than `grouping` are
/// returned; their ends snap to the covering wall ends so the patch connects.
pub fn patch_slabs(walls: &[Segment], slabs: &[Loop], tol: &Tolerances) -> Vec<Segment> {
    let mut patches = Vec::new();
    for slab in slabs {
        for edge in slab.edges() {
            let len = edge.length();
            if len <= tol.grouping {
                continue;
            }

            // (start, end, point at start, point at end) in edge length units.
            let mut covered: Vec<(f64, f64, Point2D, Point2D)> = walls
                .iter()
                .filter(|w| {
                    w.is_parallel(&edge, tol.angle)
                        && edge.line_distance(&w.start) <= tol.perimeter_offset
                        && edge.line_distance(&w.end) <= tol.perimeter_offset
                })
                .filter_map(|w| {
                    let (ps, pe) = if edge.param_of(&w.start) <= edge.param_of(&w.end) {
                        (w.start, w.end)
                    } else {
                        (w.end, w.start)
                    };
                    let lo = edge.param_of(&ps) * len;
                    let hi = edge.param_of(&pe) * len;
                    (hi > 0.0 && lo < len).then_some((lo, hi, ps, pe))
                })
                .collect();
            covered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut cursor = 0.0;
            let mut cursor_point = edge.start;
            for (lo, hi, ps, pe) in merge_cover(covered) {
                if lo - cursor > tol.grouping {
                    patches.push(Segment::new(cursor_point, ps));
                }
                if hi > cursor {
                    cursor = hi;
                    cursor_point = if hi >= len { edge.end } else { pe };
                }
            }
            if len - cursor > tol.grouping {
                patches.push(Segment::new(cursor_point, edge.end));
            }
        }
    }
    debug!(patches = patches.len(), "patched uncovered slab edges");
    patches
}

/// Merge overlapping cover intervals, keeping the outermost end points.
fn merge_cover(intervals: Vec<(f64, f64, Point2D, Point2D)>) -> Vec<(f64, f64, Point2D, Point2D)> {
    let mut result: Vec<(f64, f64, Point2D, Point2D)> = Vec::new();
    for iv in intervals {
        match result.last_mut() {
            Some(last) if iv.0 <= last.1 => {
                if iv.1 > last.1 {
                    last.1 = iv.1;
                    last.3 = iv.3;
                }
            }
            _ => result.push(iv),
        }
    }
    result
}

/// Boundary stretches carved by door and window anchors.
#[derive(Debug, Clone, Default)]
pub struct Openings {
    pub glazing: Vec<Segment>,
    pub airwalls: Vec<Segment>,
}

/// Carve openings into the nearest perimeter edge.
///
/// An anchor with a host wall is first projected onto that wall. It then
/// carves a stretch of the opening width onto the nearest edge within
/// `perimeter_offset`, centred on its projection and clamped to the edge.
/// Windows carve glazing and doors carve airwall.
pub fn carve_openings(
    openings: &[OpeningInput],
    walls: &[WallInput],
    perimeter: &[Segment],
    tol: &Tolerances,
) -> Openings {
    let mut carved = Openings::default();
    for opening in openings {
        if opening.width <= tol.distance {
            continue;
        }
        let anchor = opening
            .wall
            .and_then(|w| walls.get(w))
            .and_then(|wall| project_onto_polyline(&opening.anchor, &wall.points))
            .unwrap_or(opening.anchor);

        let nearest = perimeter
            .iter()
            .map(|e| (e.distance_to_point(&anchor), e))
            .filter(|(d, _)| *d <= tol.perimeter_offset)
            .min_by(|a, b| a.0.total_cmp(&b.0));
        let Some((_, edge)) = nearest else {
            debug!(
                x = anchor.x,
                y = anchor.y,
                "opening anchor is not near the perimeter"
            );
            continue;
        };

        let len = edge.length();
        let center = edge.param_of(&anchor) * len;
        let lo = (center - opening.width / 2.0).clamp(0.0, len);
        let hi = (center + opening.width / 2.0).clamp(0.0, len);
        if hi - lo <= tol.distance {
            continue;
        }
        let stretch = Segment::new(edge.point_at(lo / len), edge.point_at(hi / len));
        match opening.kind {
            OpeningKind::Window => carved.glazing.push(stretch),
            OpeningKind::Door => carved.airwalls.push(stretch),
        }
    }
    carved
}

/// Closest point on a polyline, `None` for fewer than two points.
fn project_onto_polyline(p: &Point2D, points: &[Point2D]) -> Option<Point2D> {
    points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .filter(|s| s.length() > f64::EPSILON)
        .map(|s| s.point_at(s.param_of(p).clamp(0.0, 1.0)))
        .min_by(|a, b| a.distance_sq(p).total_cmp(&b.distance_sq(p)))
}

/// Portions of `edges` that run along one of the `references`.
///
/// Region edges sit on the aligned grid, so a reference counts when it is
/// parallel and within `alignment` of the edge. The overlapping part of the
/// edge is returned.
pub fn classify_edges(edges: &[Segment], references: &[Segment], tol: &Tolerances) -> Vec<Segment> {
    let mut out = Vec::new();
    for edge in edges {
        let len = edge.length();
        if len < tol.distance {
            continue;
        }
        for r in references {
            if !edge.is_parallel(r, tol.angle)
                || edge.line_distance(&r.start) > tol.alignment
                || edge.line_distance(&r.end) > tol.alignment
            {
                continue;
            }
            let a = edge.param_of(&r.start).clamp(0.0, 1.0);
            let b = edge.param_of(&r.end).clamp(0.0, 1.0);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if (hi - lo) * len > tol.grouping {
                out.push(Segment::new(edge.point_at(lo), edge.point_at(hi)));
            }
        }
    }
    out
}

/// Same end points in either direction.
fn same_edge(a: &Segment, b: &Segment, tolerance: f64) -> bool {
    let forward = a.start.approx_eq(&b.start, tolerance) && a.end.approx_eq(&b.end, tolerance);
    let backward = a.start.approx_eq(&b.end, tolerance) && a.end.approx_eq(&b.start, tolerance);
    forward || backward
}

/// Unique edges of a set of loops; an edge shared by two loops appears once.
pub fn unique_edges<'a>(
    loops: impl IntoIterator<Item = &'a Loop>,
    tol: &Tolerances,
) -> Vec<Segment> {
    let mut edges: Vec<Segment> = Vec::new();
    for l in loops {
        for e in l.edges() {
            if !edges.iter().any(|s| same_edge(s, &e, tol.distance)) {
                edges.push(e);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn tol() -> Tolerances {
        Tolerances::default()
    }

    fn square(cx: f64, cy: f64, half: f64) -> Loop {
        Loop::from_points(
            &[
                Point2D::new(cx - half, cy - half),
                Point2D::new(cx + half, cy - half),
                Point2D::new(cx + half, cy + half),
                Point2D::new(cx - half, cy + half),
            ],
            &tol(),
        )
        .unwrap()
    }

    #[test]
    fn test_collinear_walls_bridged_across_column() {
        let mut diag = Diagnostics::new(0);
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 4.7, 0.0),
            Segment::from_coords(5.3, 0.0, 10.0, 0.0),
        ];
        let patched = patch_columns(&mut segments, &[square(5.0, 0.0, 0.2)], &tol(), &mut diag);
        assert_eq!(patched, 1);
        assert_eq!(segments.len(), 3);
        assert_relative_eq!(segments[2].length(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_corner_walls_extended_into_column() {
        let mut diag = Diagnostics::new(0);
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 9.7, 0.0),
            Segment::from_coords(10.0, 8.0, 10.0, 0.3),
        ];
        patch_columns(&mut segments, &[square(10.0, 0.0, 0.2)], &tol(), &mut diag);
        assert!(segments[0].end.approx_eq(&Point2D::new(10.0, 0.0), 1e-9));
        assert!(segments[1].end.approx_eq(&Point2D::new(10.0, 0.0), 1e-9));
    }

    #[test]
    fn test_lone_wall_end_reaches_crossing_wall() {
        let mut diag = Diagnostics::new(0);
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.0),
            Segment::from_coords(5.0, 8.0, 5.0, 0.2),
        ];
        let patched = patch_columns(&mut segments, &[square(5.0, 0.0, 0.2)], &tol(), &mut diag);
        assert_eq!(patched, 1);
        assert_eq!(segments.len(), 2);
        assert!(segments[1].start.approx_eq(&Point2D::new(5.0, 8.0), 1e-12));
        assert!(segments[1].end.approx_eq(&Point2D::new(5.0, 0.0), 1e-9));
        assert_relative_eq!(segments[0].end.x, 10.0);
    }

    #[test]
    fn test_lone_wall_end_away_from_crossing_wall() {
        let mut diag = Diagnostics::new(0);
        // The column stands on the partition, not on the through wall.
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.0),
            Segment::from_coords(5.0, 8.0, 5.0, 3.0),
        ];
        let patched = patch_columns(&mut segments, &[square(5.0, 2.8, 0.2)], &tol(), &mut diag);
        assert_eq!(patched, 0);
        assert!(segments[1].end.approx_eq(&Point2D::new(5.0, 3.0), 1e-12));
    }

    #[test]
    fn test_offset_parallel_walls_at_column_recorded() {
        let mut diag = Diagnostics::new(0);
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 4.8, 0.0),
            Segment::from_coords(5.2, 0.3, 10.0, 0.3),
        ];
        let patched = patch_columns(&mut segments, &[square(5.0, 0.15, 0.2)], &tol(), &mut diag);
        assert_eq!(patched, 0);
        assert_eq!(segments.len(), 2);
        assert_eq!(diag.count(AnomalyKind::UnresolvedIntersection), 1);
    }

    #[test]
    fn test_wall_through_column_untouched() {
        let mut diag = Diagnostics::new(0);
        let mut segments = vec![Segment::from_coords(0.0, 0.0, 10.0, 0.0)];
        let patched = patch_columns(&mut segments, &[square(5.0, 0.0, 0.2)], &tol(), &mut diag);
        assert_eq!(patched, 0);
        assert_eq!(segments.len(), 1);
        assert_relative_eq!(segments[0].end.x, 10.0);
    }

    #[test]
    fn test_slab_gap_becomes_separation() {
        let slab = Loop::from_points(
            &[
                Point2D::new(0.0, 0.0),
                Point2D::new(10.0, 0.0),
                Point2D::new(10.0, 8.0),
                Point2D::new(0.0, 8.0),
            ],
            &tol(),
        )
        .unwrap();
        let walls = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.0),
            Segment::from_coords(10.0, 0.0, 10.0, 8.0),
            Segment::from_coords(0.0, 8.0, 0.0, 0.0),
            // Top edge only half covered.
            Segment::from_coords(10.0, 8.0, 5.0, 8.0),
        ];
        let patches = patch_slabs(&walls, &[slab], &tol());
        assert_eq!(patches.len(), 1);
        assert_relative_eq!(patches[0].length(), 5.0, epsilon = 1e-9);
        assert!(patches[0].start.approx_eq(&Point2D::new(5.0, 8.0), 1e-9));
        assert!(patches[0].end.approx_eq(&Point2D::new(0.0, 8.0), 1e-9));
    }

    #[test]
    fn test_openings_carved_on_nearest_edge() {
        let perimeter = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.0),
            Segment::from_coords(10.0, 0.0, 10.0, 8.0),
        ];
        let openings = vec![
            OpeningInput {
                kind: OpeningKind::Window,
                anchor: Point2D::new(3.0, 0.1),
                width: 2.0,
                wall: None,
            },
            OpeningInput {
                kind: OpeningKind::Door,
                anchor: Point2D::new(9.8, 7.9),
                width: 1.0,
                wall: None,
            },
        ];
        let carved = carve_openings(&openings, &[], &perimeter, &tol());
        assert_eq!(carved.glazing.len(), 1);
        assert_relative_eq!(carved.glazing[0].start.x, 2.0);
        assert_relative_eq!(carved.glazing[0].end.x, 4.0);
        // Clamped at the top of the right edge.
        assert_eq!(carved.airwalls.len(), 1);
        assert_relative_eq!(carved.airwalls[0].length(), 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_anchor_projected_onto_host_wall() {
        let walls = vec![WallInput::line(0.0, 0.2, 10.0, 0.2, Default::default())];
        let perimeter = vec![Segment::from_coords(0.0, 0.0, 10.0, 0.0)];
        let openings = vec![OpeningInput {
            kind: OpeningKind::Window,
            anchor: Point2D::new(5.0, 3.0),
            width: 1.0,
            wall: Some(0),
        }];
        let carved = carve_openings(&openings, &walls, &perimeter, &tol());
        assert_eq!(carved.glazing.len(), 1);
        assert_relative_eq!(carved.glazing[0].midpoint().x, 5.0);
    }

    #[test]
    fn test_classify_edges_returns_overlap() {
        let edges = vec![Segment::from_coords(0.0, 0.0, 10.0, 0.0)];
        let curtain = vec![Segment::from_coords(2.0, 0.1, 6.0, 0.1)];
        let glazing = classify_edges(&edges, &curtain, &tol());
        assert_eq!(glazing.len(), 1);
        assert_relative_eq!(glazing[0].length(), 4.0);
        let far = vec![Segment::from_coords(2.0, 1.0, 6.0, 1.0)];
        assert!(classify_edges(&edges, &far, &tol()).is_empty());
    }
}
