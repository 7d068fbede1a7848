//! Perimeter matching of border and corner pieces.
//!
//! Each participating piece contributes the edge just before its straight
//! side(s) to the left pool and the edge just after to the right pool. A
//! dense cost matrix between the pools is resolved greedily, cheapest pair
//! first.

use jigsaw_core::signed_area;
use log::{debug, info};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::groups::PieceGroups;
use crate::params::BorderMatchParams;
use crate::piece::{Edge, EdgeRef, PieceId};
use crate::puzzle::Puzzle;

/// Cost of an impossible pair.
pub const INCOMPATIBLE: f64 = f64::MAX;

/// Shape mismatch between two edges.
///
/// The second normalized curve is turned by 180 degrees and appended at the
/// end of the first; a tab and its blank then trace a closed loop of almost
/// no area. Flat edges and edges of the same piece are [`INCOMPATIBLE`].
pub fn edge_distance(a: &Edge, b: &Edge) -> f64 {
    if a.flat || b.flat || a.parent == b.parent {
        return INCOMPATIBLE;
    }
    let Some(&end) = a.normalized.last() else {
        return INCOMPATIBLE;
    };
    let mut loop_pts = Vec::with_capacity(a.normalized.len() + b.normalized.len());
    loop_pts.extend_from_slice(&a.normalized);
    loop_pts.extend(
        b.normalized
            .iter()
            .map(|p| Point2::new(end.x - p.x, end.y - p.y)),
    );
    let area = signed_area(&loop_pts).abs();
    if area.is_finite() {
        area
    } else {
        INCOMPATIBLE
    }
}

/// One accepted connection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchedPair {
    pub left: EdgeRef,
    pub right: EdgeRef,
    pub cost: f64,
}

/// Outcome of a matcher run.
#[derive(Clone, Debug, Default)]
pub struct BorderMatch {
    pub pairs: Vec<MatchedPair>,
    /// Perimeter pieces that took part.
    pub participants: Vec<PieceId>,
    /// Perimeter pieces without usable flat-neighbour edges.
    pub excluded: Vec<PieceId>,
}

/// Greedy perimeter matcher.
#[derive(Clone, Debug, Default)]
pub struct BorderMatcher {
    params: BorderMatchParams,
}

impl BorderMatcher {
    pub fn new(params: BorderMatchParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &BorderMatchParams {
        &self.params
    }

    /// Match the border and corner pieces of `puzzle` and record the
    /// connections in it.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn run(&self, puzzle: &mut Puzzle) -> BorderMatch {
        let mut out = BorderMatch::default();
        let mut left = Vec::new();
        let mut right = Vec::new();
        for piece in puzzle.perimeter() {
            match piece.flat_neighbours() {
                Some((before, after)) => {
                    out.participants.push(piece.id);
                    left.push(piece.edges[before.get()].reference());
                    right.push(piece.edges[after.get()].reference());
                }
                None => out.excluded.push(piece.id),
            }
        }

        let cost = cost_matrix(puzzle, &left, &right);
        let mut groups = puzzle.groups().clone();
        let picks = greedy_pairs(
            &cost,
            &piece_of(&left),
            &piece_of(&right),
            &mut groups,
            &self.params,
        );

        for (i, j, c) in picks {
            let (l, r) = (left[i], right[j]);
            if puzzle.connect(l, r) {
                debug!("connected {l} <-> {r} (cost {c:.2})");
                out.pairs.push(MatchedPair {
                    left: l,
                    right: r,
                    cost: c,
                });
            }
        }
        info!(
            "border matcher: {} pieces, {} connections, {} excluded",
            out.participants.len(),
            out.pairs.len(),
            out.excluded.len()
        );
        out
    }
}

fn piece_of(edges: &[EdgeRef]) -> Vec<PieceId> {
    edges.iter().map(|e| e.piece).collect()
}

/// `cost[i][j] = edge_distance(left[i], right[j])`.
pub fn cost_matrix(puzzle: &Puzzle, left: &[EdgeRef], right: &[EdgeRef]) -> Vec<Vec<f64>> {
    left.iter()
        .map(|&l| {
            right
                .iter()
                .map(|&r| match (puzzle.edge(l), puzzle.edge(r)) {
                    (Some(a), Some(b)) => edge_distance(a, b),
                    _ => INCOMPATIBLE,
                })
                .collect()
        })
        .collect()
}

/// Greedy assignment over `cost` (rows = left pool, columns = right pool).
///
/// Repeatedly takes the cheapest remaining pair (first found on ties, row
/// major), merging the owners in `groups`. With the cycle guard on, a pair
/// whose pieces already share a group is passed over unless it is the last
/// row left, which closes the perimeter. Stops when no admissible pair
/// remains.
fn greedy_pairs(
    cost: &[Vec<f64>],
    row_piece: &[PieceId],
    col_piece: &[PieceId],
    groups: &mut PieceGroups,
    params: &BorderMatchParams,
) -> Vec<(usize, usize, f64)> {
    let ceiling = params.cost_ceiling.unwrap_or(f64::INFINITY);
    let mut row_open = vec![true; row_piece.len()];
    let mut col_open = vec![true; col_piece.len()];
    let mut picks = Vec::new();

    loop {
        let remaining = row_open.iter().filter(|&&o| o).count();
        if remaining == 0 || !col_open.iter().any(|&o| o) {
            break;
        }

        let mut best: Option<(usize, usize, f64)> = None;
        for (i, row) in cost.iter().enumerate() {
            if !row_open[i] {
                continue;
            }
            for (j, &c) in row.iter().enumerate() {
                if !col_open[j] || c >= INCOMPATIBLE || !c.is_finite() || c > ceiling {
                    continue;
                }
                if best.is_some_and(|(_, _, b)| c >= b) {
                    continue;
                }
                let (a, b) = (row_piece[i], col_piece[j]);
                if a == b {
                    continue;
                }
                if params.cycle_guard && remaining > 1 && groups.same_group(a, b) {
                    continue;
                }
                best = Some((i, j, c));
            }
        }

        let Some((i, j, c)) = best else {
            break;
        };
        row_open[i] = false;
        col_open[j] = false;
        groups.union(row_piece[i], col_piece[j]);
        picks.push((i, j, c));
    }
    picks
}
