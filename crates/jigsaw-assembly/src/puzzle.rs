use crate::groups::PieceGroups;
use crate::piece::{Edge, EdgeRef, Piece, PieceId, PieceKind};

/// Piece arena plus the connectivity groups induced by edge connections.
#[derive(Clone, Debug, Default)]
pub struct Puzzle {
    pieces: Vec<Piece>,
    groups: PieceGroups,
}

impl Puzzle {
    /// Wrap `pieces`; their ids must equal their positions.
    pub fn new(pieces: Vec<Piece>) -> Self {
        debug_assert!(pieces.iter().enumerate().all(|(i, p)| p.id.0 == i));
        let groups = PieceGroups::new(pieces.len());
        Self { pieces, groups }
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn pieces_mut(&mut self) -> &mut [Piece] {
        &mut self.pieces
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0)
    }

    #[inline]
    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id.0)
    }

    pub fn edge(&self, r: EdgeRef) -> Option<&Edge> {
        self.piece(r.piece)?.edge(r.index)
    }

    fn edge_mut(&mut self, r: EdgeRef) -> Option<&mut Edge> {
        self.piece_mut(r.piece)?.edge_mut(r.index)
    }

    /// The edge connected to `r`, if any.
    pub fn partner(&self, r: EdgeRef) -> Option<EdgeRef> {
        self.edge(r)?.connection
    }

    /// Link two edges symmetrically and merge their pieces' groups.
    ///
    /// Refuses self-connections, unknown edges and edges that are already
    /// connected.
    pub fn connect(&mut self, a: EdgeRef, b: EdgeRef) -> bool {
        if a == b {
            return false;
        }
        match (self.edge(a), self.edge(b)) {
            (Some(ea), Some(eb)) if ea.connection.is_none() && eb.connection.is_none() => {}
            _ => return false,
        }
        if let Some(e) = self.edge_mut(a) {
            e.connection = Some(b);
        }
        if let Some(e) = self.edge_mut(b) {
            e.connection = Some(a);
        }
        self.groups.union(a.piece, b.piece);
        true
    }

    #[inline]
    pub fn groups(&self) -> &PieceGroups {
        &self.groups
    }

    pub fn same_group(&mut self, a: PieceId, b: PieceId) -> bool {
        self.groups.same_group(a, b)
    }

    pub fn group_size(&mut self, piece: PieceId) -> usize {
        self.groups.group_size(piece)
    }

    /// Every connection once, as `(lower, higher)` edge references.
    pub fn connections(&self) -> Vec<(EdgeRef, EdgeRef)> {
        let mut out = Vec::new();
        for piece in &self.pieces {
            for edge in &piece.edges {
                if let Some(other) = edge.connection {
                    let here = edge.reference();
                    if here < other {
                        out.push((here, other));
                    }
                }
            }
        }
        out
    }

    /// Drop every connection, group and placement; pieces and their edge
    /// models stay.
    pub fn reset_connections(&mut self) {
        for piece in &mut self.pieces {
            for edge in &mut piece.edges {
                edge.connection = None;
            }
            piece.placement = None;
        }
        self.groups.reset();
    }

    /// Pieces classified as corners.
    pub fn corners(&self) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(|p| p.kind == Some(PieceKind::Corner))
    }

    /// Border and corner pieces.
    pub fn perimeter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(|p| p.kind.is_some_and(PieceKind::is_perimeter))
    }

    pub fn into_pieces(self) -> Vec<Piece> {
        self.pieces
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::piece::{Edge, EdgeIndex, Piece, PieceId, PieceKind};
    use image::{GrayImage, RgbImage};
    use nalgebra::Point2;

    /// A modeled piece with four straight dummy edges.
    pub fn stub_piece(id: usize, flats: [bool; 4]) -> Piece {
        let mut p = Piece::new(
            PieceId(id),
            [0, 0],
            RgbImage::new(1, 1),
            GrayImage::new(1, 1),
            Vec::new(),
        );
        p.edges = (0..4)
            .map(|i| Edge {
                parent: PieceId(id),
                index: EdgeIndex::new(i),
                curve: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
                normalized: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
                flat: flats[i],
                connection: None,
            })
            .collect();
        p.kind = PieceKind::from_flat_count(p.flat_count());
        p
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::stub_piece;
    use super::*;
    use crate::piece::EdgeIndex;

    fn er(p: usize, i: usize) -> EdgeRef {
        EdgeRef::new(PieceId(p), EdgeIndex::new(i))
    }

    #[test]
    fn connect_is_symmetric_and_groups_pieces() {
        let mut puzzle = Puzzle::new(vec![stub_piece(0, [false; 4]), stub_piece(1, [false; 4])]);
        assert!(puzzle.connect(er(0, 1), er(1, 3)));
        assert_eq!(puzzle.partner(er(0, 1)), Some(er(1, 3)));
        assert_eq!(puzzle.partner(er(1, 3)), Some(er(0, 1)));
        assert!(puzzle.same_group(PieceId(0), PieceId(1)));
        assert_eq!(puzzle.connections(), vec![(er(0, 1), er(1, 3))]);
    }

    #[test]
    fn rejects_self_and_double_connections() {
        let mut puzzle = Puzzle::new(vec![stub_piece(0, [false; 4]), stub_piece(1, [false; 4])]);
        assert!(!puzzle.connect(er(0, 0), er(0, 0)));
        assert!(puzzle.connect(er(0, 0), er(1, 0)));
        assert!(!puzzle.connect(er(0, 0), er(1, 2)));
        assert!(!puzzle.connect(er(0, 2), er(5, 0)));
    }

    #[test]
    fn reset_clears_connections_and_groups() {
        let mut puzzle = Puzzle::new(vec![stub_piece(0, [false; 4]), stub_piece(1, [false; 4])]);
        puzzle.connect(er(0, 0), er(1, 0));
        puzzle.reset_connections();
        assert!(puzzle.connections().is_empty());
        assert!(!puzzle.same_group(PieceId(0), PieceId(1)));
    }

    #[test]
    fn corner_listing() {
        let puzzle = Puzzle::new(vec![
            stub_piece(0, [true, true, false, false]),
            stub_piece(1, [true, false, false, false]),
            stub_piece(2, [false; 4]),
        ]);
        let corners: Vec<PieceId> = puzzle.corners().map(|p| p.id).collect();
        assert_eq!(corners, vec![PieceId(0)]);
        assert_eq!(puzzle.perimeter().count(), 2);
    }
}
