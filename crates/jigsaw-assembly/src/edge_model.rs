//! Corner detection, edge cutting, flatness and tilt.

use imageproc::geometry::{approximate_polygon_dp, min_area_rect};
use imageproc::point::Point;
use jigsaw_core::{bounding_box, normalize_degrees};
use log::debug;
use nalgebra::{Point2, Rotation2, Vector2};

use crate::error::PieceIssue;
use crate::params::EdgeModelParams;
use crate::piece::{Edge, EdgeIndex, Piece, PieceId, PieceKind};

/// Turns a piece contour into four classified edges.
#[derive(Clone, Debug, Default)]
pub struct EdgeModeler {
    params: EdgeModelParams,
}

impl EdgeModeler {
    pub fn new(params: EdgeModelParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &EdgeModelParams {
        &self.params
    }

    /// Fill `piece.edges`, `piece.kind` and `piece.tilt`.
    ///
    /// On error the piece is left without edges (degenerate geometry) or
    /// without a kind (unsupported flat-edge count).
    pub fn model(&self, piece: &mut Piece) -> Result<(), PieceIssue> {
        piece.edges.clear();
        piece.kind = None;

        let edges = self.cut_edges(piece.id, &piece.contour)?;
        let tilt = tilt_degrees(&edges).ok_or_else(|| PieceIssue::DegeneratePiece {
            piece: piece.id,
            reason: "edge midpoints coincide".to_string(),
        })?;
        let flat = edges.iter().filter(|e| e.flat).count();

        piece.edges = edges;
        piece.tilt = tilt;
        piece.kind = PieceKind::from_flat_count(flat);
        match piece.kind {
            Some(kind) => {
                debug!("piece {}: {:?}, tilt {:.1} deg", piece.id, kind, tilt);
                Ok(())
            }
            None => Err(PieceIssue::UnclassifiedPiece {
                piece: piece.id,
                flat,
            }),
        }
    }

    fn cut_edges(&self, id: PieceId, contour: &[Point2<f64>]) -> Result<Vec<Edge>, PieceIssue> {
        let degenerate = |reason: &str| PieceIssue::DegeneratePiece {
            piece: id,
            reason: reason.to_string(),
        };

        let polygon = self.reduce(contour);
        if polygon.len() < 4 {
            return Err(degenerate("fewer than four polygon vertices"));
        }
        let corners = corner_indices(&polygon).ok_or_else(|| degenerate("corners are not distinct"))?;

        let mut edges = Vec::with_capacity(4);
        for k in 0..4 {
            let (start, end) = (corners[k], corners[(k + 1) % 4]);
            let curve: Vec<Point2<f64>> = if start < end {
                polygon[start..=end].to_vec()
            } else {
                polygon[start..]
                    .iter()
                    .chain(&polygon[..=end])
                    .copied()
                    .collect()
            };
            let normalized =
                normalize_curve(&curve).ok_or_else(|| degenerate("zero-length edge chord"))?;
            let flat = is_flat(&normalized, self.params.flatness_threshold);
            edges.push(Edge {
                parent: id,
                index: EdgeIndex::new(k),
                curve,
                normalized,
                flat,
                connection: None,
            });
        }
        Ok(edges)
    }

    /// Douglas-Peucker reduction on the integer contour, without repeated
    /// vertices. The contour is open (last point not repeated), so both of
    /// its end points survive the reduction.
    fn reduce(&self, contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
        if contour.len() < 3 {
            return Vec::new();
        }
        let pts: Vec<Point<i32>> = contour
            .iter()
            .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
            .collect();
        let eps = self.params.polygon_tolerance.max(1e-3);
        let mut reduced = approximate_polygon_dp(&pts, eps, false);
        reduced.dedup();
        while reduced.len() > 1 && reduced.first() == reduced.last() {
            reduced.pop();
        }
        reduced
            .into_iter()
            .map(|p| Point2::new(p.x as f64, p.y as f64))
            .collect()
    }
}

/// Indices of the polygon vertices nearest to the corners of its minimum-area
/// rectangle, ascending. `None` unless all four are distinct.
fn corner_indices(polygon: &[Point2<f64>]) -> Option<[usize; 4]> {
    let pts: Vec<Point<i32>> = polygon
        .iter()
        .map(|p| Point::new(p.x as i32, p.y as i32))
        .collect();
    let rect = min_area_rect(&pts);

    let mut ids = [0usize; 4];
    for (slot, corner) in ids.iter_mut().zip(rect.iter()) {
        let c = Point2::new(corner.x as f64, corner.y as f64);
        let mut best = f64::MAX;
        for (i, p) in polygon.iter().enumerate() {
            let d = (p - c).norm_squared();
            if d < best {
                best = d;
                *slot = i;
            }
        }
    }
    ids.sort_unstable();
    if ids.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    Some(ids)
}

/// Translate `curve` to start at the origin and rotate it so its end lies
/// on the positive x axis. `None` for empty curves or a zero-length chord.
pub fn normalize_curve(curve: &[Point2<f64>]) -> Option<Vec<Point2<f64>>> {
    let start = *curve.first()?;
    let end = *curve.last()?;
    let chord: Vector2<f64> = end - start;
    if chord.norm() < 1e-9 {
        return None;
    }
    let rot = Rotation2::new(-chord.y.atan2(chord.x));
    Some(
        curve
            .iter()
            .map(|p| Point2::from(rot * (p - start)))
            .collect(),
    )
}

/// A normalized curve is flat when its bounding box is much wider than tall.
pub fn is_flat(normalized: &[Point2<f64>], threshold: f64) -> bool {
    match bounding_box(normalized) {
        Some(bb) if bb.width() > 1e-9 => bb.height() / bb.width() < threshold,
        _ => false,
    }
}

/// Direction from edge 2's midpoint to edge 0's midpoint, degrees in `[0, 360)`.
fn tilt_degrees(edges: &[Edge]) -> Option<f64> {
    let a = edges.get(2)?.midpoint()?;
    let b = edges.first()?.midpoint()?;
    let d = b - a;
    if d.norm() < 1e-9 {
        return None;
    }
    Some(normalize_degrees(d.y.atan2(d.x).to_degrees()))
}
