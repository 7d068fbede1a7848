//! Piece and edge data model.
//!
//! Pieces live in an arena ([`crate::Puzzle`]) and are addressed by
//! [`PieceId`]; edges point back at their piece through the same id and
//! reference their partner through an [`EdgeRef`].

use std::fmt;

use image::{GrayImage, RgbImage};
use jigsaw_core::{polygon_centroid, GridCell, QuarterTurn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Index of a piece in the puzzle arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub usize);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of an edge in its piece's contour traversal, always in `0..4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeIndex(u8);

impl EdgeIndex {
    pub const ALL: [EdgeIndex; 4] = [EdgeIndex(0), EdgeIndex(1), EdgeIndex(2), EdgeIndex(3)];

    /// Wraps `i` modulo 4.
    #[inline]
    pub fn new(i: usize) -> Self {
        Self((i % 4) as u8)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn next(self) -> Self {
        Self::new(self.get() + 1)
    }

    #[inline]
    pub fn prev(self) -> Self {
        Self::new(self.get() + 3)
    }

    #[inline]
    pub fn opposite(self) -> Self {
        Self::new(self.get() + 2)
    }
}

/// Address of one edge in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    pub piece: PieceId,
    pub index: EdgeIndex,
}

impl EdgeRef {
    #[inline]
    pub fn new(piece: PieceId, index: EdgeIndex) -> Self {
        Self { piece, index }
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/e{}", self.piece, self.index.get())
    }
}

/// Coarse piece class derived from the number of flat edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Interior,
    Border,
    Corner,
}

impl PieceKind {
    /// `0 -> Interior`, `1 -> Border`, `2 -> Corner`, anything else is not a
    /// valid puzzle piece.
    pub fn from_flat_count(flat: usize) -> Option<Self> {
        match flat {
            0 => Some(PieceKind::Interior),
            1 => Some(PieceKind::Border),
            2 => Some(PieceKind::Corner),
            _ => None,
        }
    }

    /// Border and corner pieces take part in perimeter matching.
    #[inline]
    pub fn is_perimeter(self) -> bool {
        matches!(self, PieceKind::Border | PieceKind::Corner)
    }
}

/// Grid cell and discrete rotation assigned by the layout resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub cell: GridCell,
    pub rotation: QuarterTurn,
}

/// One of the four contour arcs between consecutive piece corners.
#[derive(Clone, Debug)]
pub struct Edge {
    pub parent: PieceId,
    pub index: EdgeIndex,
    /// Contour points from the start corner to the end corner, inclusive,
    /// in piece-local coordinates.
    pub curve: Vec<Point2<f64>>,
    /// `curve` moved so it starts at the origin and ends on the +x axis.
    pub normalized: Vec<Point2<f64>>,
    pub flat: bool,
    pub connection: Option<EdgeRef>,
}

impl Edge {
    #[inline]
    pub fn reference(&self) -> EdgeRef {
        EdgeRef::new(self.parent, self.index)
    }

    pub fn start(&self) -> Option<Point2<f64>> {
        self.curve.first().copied()
    }

    pub fn end(&self) -> Option<Point2<f64>> {
        self.curve.last().copied()
    }

    /// Midpoint of the chord joining the edge's two corners.
    pub fn midpoint(&self) -> Option<Point2<f64>> {
        let (a, b) = (self.start()?, self.end()?);
        Some(nalgebra::center(&a, &b))
    }
}

/// A segmented puzzle piece.
///
/// The raster, mask and contour are fixed at segmentation time; edges,
/// classification and tilt are filled by the edge modeler, placement by the
/// layout resolver.
#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    /// Top-left corner of the crop in scene pixels.
    pub origin: [u32; 2],
    pub image: RgbImage,
    /// Silhouette of the piece inside `image` (255 = piece).
    pub mask: GrayImage,
    /// Closed outline in crop coordinates, counter-clockwise on screen.
    pub contour: Vec<Point2<f64>>,
    /// Empty until modeled; exactly four afterwards.
    pub edges: Vec<Edge>,
    pub kind: Option<PieceKind>,
    /// Direction from edge 2's midpoint to edge 0's midpoint, degrees in `[0, 360)`.
    pub tilt: f64,
    pub placement: Option<Placement>,
}

impl Piece {
    pub fn new(
        id: PieceId,
        origin: [u32; 2],
        image: RgbImage,
        mask: GrayImage,
        contour: Vec<Point2<f64>>,
    ) -> Self {
        Self {
            id,
            origin,
            image,
            mask,
            contour,
            edges: Vec::new(),
            kind: None,
            tilt: 0.0,
            placement: None,
        }
    }

    #[inline]
    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.get())
    }

    #[inline]
    pub fn edge_mut(&mut self, index: EdgeIndex) -> Option<&mut Edge> {
        self.edges.get_mut(index.get())
    }

    #[inline]
    pub fn is_modeled(&self) -> bool {
        self.edges.len() == 4 && self.kind.is_some()
    }

    pub fn flat_count(&self) -> usize {
        self.edges.iter().filter(|e| e.flat).count()
    }

    /// Area centroid of the contour.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        polygon_centroid(&self.contour)
    }

    /// The two edges adjacent to the piece's straight side(s), as
    /// `(before, after)` in traversal order.
    ///
    /// For a border piece these surround its single flat edge. For a corner
    /// piece they are the edge before the first and the edge after the second
    /// of two consecutive flat edges. Interior pieces, unmodeled pieces and
    /// corners whose flat edges are not adjacent have none.
    pub fn flat_neighbours(&self) -> Option<(EdgeIndex, EdgeIndex)> {
        if !self.is_modeled() {
            return None;
        }
        let flat = |i: EdgeIndex| self.edges[i.get()].flat;
        match self.kind? {
            PieceKind::Interior => None,
            PieceKind::Border => EdgeIndex::ALL
                .into_iter()
                .find(|&i| flat(i))
                .map(|e| (e.prev(), e.next())),
            PieceKind::Corner => EdgeIndex::ALL
                .into_iter()
                .find(|&i| flat(i) && flat(i.next()))
                .map(|e| (e.prev(), e.opposite())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(parent: usize, i: usize, flat: bool) -> Edge {
        Edge {
            parent: PieceId(parent),
            index: EdgeIndex::new(i),
            curve: vec![Point2::new(0.0, 0.0), Point2::new(4.0, 2.0)],
            normalized: Vec::new(),
            flat,
            connection: None,
        }
    }

    fn piece_with_flats(flats: [bool; 4]) -> Piece {
        let mut p = Piece::new(
            PieceId(0),
            [0, 0],
            RgbImage::new(1, 1),
            GrayImage::new(1, 1),
            Vec::new(),
        );
        p.edges = (0..4).map(|i| edge(0, i, flats[i])).collect();
        p.kind = PieceKind::from_flat_count(p.flat_count());
        p
    }

    #[test]
    fn edge_index_arithmetic_wraps() {
        let e = EdgeIndex::new(3);
        assert_eq!(e.next(), EdgeIndex::new(0));
        assert_eq!(e.prev(), EdgeIndex::new(2));
        assert_eq!(e.opposite(), EdgeIndex::new(1));
        assert_eq!(EdgeIndex::new(0).prev(), EdgeIndex::new(3));
    }

    #[test]
    fn classification_by_flat_count() {
        assert_eq!(PieceKind::from_flat_count(0), Some(PieceKind::Interior));
        assert_eq!(PieceKind::from_flat_count(1), Some(PieceKind::Border));
        assert_eq!(PieceKind::from_flat_count(2), Some(PieceKind::Corner));
        assert_eq!(PieceKind::from_flat_count(3), None);
    }

    #[test]
    fn border_neighbours_surround_flat_edge() {
        let p = piece_with_flats([false, false, true, false]);
        assert_eq!(p.kind, Some(PieceKind::Border));
        assert_eq!(p.flat_neighbours(), Some((EdgeIndex::new(1), EdgeIndex::new(3))));
    }

    #[test]
    fn corner_neighbours_wrap_around_flat_pair() {
        let p = piece_with_flats([true, false, false, true]);
        assert_eq!(p.kind, Some(PieceKind::Corner));
        // Flat pair is (3, 0): before 3 is 2, after 0 is 1.
        assert_eq!(p.flat_neighbours(), Some((EdgeIndex::new(2), EdgeIndex::new(1))));
    }

    #[test]
    fn split_corner_and_interior_have_no_neighbours() {
        assert!(piece_with_flats([true, false, true, false]).flat_neighbours().is_none());
        assert!(piece_with_flats([false; 4]).flat_neighbours().is_none());
    }

    #[test]
    fn chord_midpoint() {
        let e = edge(0, 0, false);
        assert_eq!(e.midpoint(), Some(Point2::new(2.0, 1.0)));
    }
}
