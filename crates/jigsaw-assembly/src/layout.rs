//! Grid placement by walking the resolved edge connections.

use std::collections::HashMap;

use jigsaw_core::{Direction, GridCell, QuarterTurn};
use log::{debug, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::piece::{PieceId, Placement};
use crate::puzzle::Puzzle;

/// Side of the grid cell an edge faces once its piece is turned by
/// `rotation`.
#[inline]
pub fn facing(edge_index: usize, rotation: QuarterTurn) -> Direction {
    Direction::from_index(edge_index as i32 - rotation.turns() + 2)
}

/// Rotation of a neighbour reached by stepping towards `dir` whose edge
/// `edge_index` is the connected one. That edge then faces back against
/// `dir`, i.e. towards `dir.opposite()`.
#[inline]
pub fn rotation_for(edge_index: usize, dir: Direction) -> QuarterTurn {
    QuarterTurn::new(edge_index as i32 - dir.index())
}

/// Result of a layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub anchor: Option<PieceId>,
    /// Pieces in visiting order, anchor first.
    pub placed: Vec<PieceId>,
    pub unplaced: Vec<PieceId>,
}

/// Places pieces depth-first from an anchor at cell (0, 0), rotation 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutResolver;

impl LayoutResolver {
    pub fn new() -> Self {
        Self
    }

    /// Lowest-id piece with at least one connection, falling back to the
    /// first piece.
    pub fn anchor(puzzle: &Puzzle) -> Option<PieceId> {
        puzzle
            .pieces()
            .iter()
            .find(|p| p.edges.iter().any(|e| e.connection.is_some()))
            .or_else(|| puzzle.pieces().first())
            .map(|p| p.id)
    }

    /// Assign [`Placement`]s to every piece reachable from the anchor.
    /// Previous placements are cleared first.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn resolve(&self, puzzle: &mut Puzzle) -> Layout {
        for piece in puzzle.pieces_mut() {
            piece.placement = None;
        }
        let Some(anchor) = Self::anchor(puzzle) else {
            return Layout::default();
        };
        self.resolve_from(puzzle, anchor)
    }

    /// Same as [`LayoutResolver::resolve`] with an explicit anchor.
    pub fn resolve_from(&self, puzzle: &mut Puzzle, anchor: PieceId) -> Layout {
        let n = puzzle.len();
        let mut layout = Layout {
            anchor: Some(anchor),
            ..Layout::default()
        };
        if anchor.0 >= n {
            layout.anchor = None;
            layout.unplaced = puzzle.pieces().iter().map(|p| p.id).collect();
            return layout;
        }

        let mut placement: Vec<Option<Placement>> = vec![None; n];
        let mut occupied: HashMap<GridCell, PieceId> = HashMap::new();
        placement[anchor.0] = Some(Placement {
            cell: GridCell::ORIGIN,
            rotation: QuarterTurn::ZERO,
        });
        occupied.insert(GridCell::ORIGIN, anchor);
        layout.placed.push(anchor);

        let mut stack = vec![anchor];
        while let Some(id) = stack.pop() {
            let (Some(here), Some(piece)) = (placement[id.0], puzzle.piece(id)) else {
                continue;
            };
            // Reverse so the lowest edge index is explored first.
            for edge in piece.edges.iter().rev() {
                let Some(other) = edge.connection else {
                    continue;
                };
                if other.piece.0 >= n || placement[other.piece.0].is_some() {
                    continue;
                }
                let dir = facing(edge.index.get(), here.rotation);
                let cell = here.cell.step(dir);
                let rotation = rotation_for(other.index.get(), dir);
                if let Some(prev) = occupied.insert(cell, other.piece) {
                    warn!(
                        "cell ({}, {}) claimed by {} and {}",
                        cell.x, cell.y, prev, other.piece
                    );
                }
                debug!(
                    "{} -> ({}, {}) rot {}",
                    other.piece,
                    cell.x,
                    cell.y,
                    rotation.turns()
                );
                placement[other.piece.0] = Some(Placement { cell, rotation });
                layout.placed.push(other.piece);
                stack.push(other.piece);
            }
        }

        for (piece, p) in puzzle.pieces_mut().iter_mut().zip(placement) {
            piece.placement = p;
            if p.is_none() {
                layout.unplaced.push(piece.id);
            }
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{EdgeIndex, EdgeRef};
    use crate::puzzle::test_support::stub_piece;

    fn er(p: usize, i: usize) -> EdgeRef {
        EdgeRef::new(PieceId(p), EdgeIndex::new(i))
    }

    fn placement(puzzle: &Puzzle, id: usize) -> Option<(i32, i32, i32)> {
        puzzle
            .piece(PieceId(id))
            .and_then(|p| p.placement)
            .map(|pl| (pl.cell.x, pl.cell.y, pl.rotation.turns()))
    }

    #[test]
    fn connected_edge_faces_back_towards_the_parent() {
        // Unrotated: edge 0 faces down, 1 right, 2 up, 3 left.
        assert_eq!(facing(0, QuarterTurn::ZERO), Direction::Down);
        assert_eq!(facing(1, QuarterTurn::ZERO), Direction::Right);
        assert_eq!(facing(2, QuarterTurn::ZERO), Direction::Up);
        assert_eq!(facing(3, QuarterTurn::ZERO), Direction::Left);
        for e in 0..4 {
            for d in Direction::ALL {
                assert_eq!(facing(e, rotation_for(e, d)), d.opposite());
            }
        }
    }

    #[test]
    fn one_by_three_row() {
        let mut puzzle = Puzzle::new(vec![
            stub_piece(0, [true, false, true, true]),
            stub_piece(1, [true, false, true, false]),
            stub_piece(2, [true, true, true, false]),
        ]);
        assert!(puzzle.connect(er(0, 1), er(1, 3)));
        assert!(puzzle.connect(er(1, 1), er(2, 3)));

        let layout = LayoutResolver::new().resolve(&mut puzzle);
        assert_eq!(layout.anchor, Some(PieceId(0)));
        assert!(layout.unplaced.is_empty());
        assert_eq!(placement(&puzzle, 0), Some((0, 0, 0)));
        assert_eq!(placement(&puzzle, 1), Some((1, 0, 0)));
        assert_eq!(placement(&puzzle, 2), Some((2, 0, 0)));
    }

    #[test]
    fn rotated_neighbour_gets_quarter_turn() {
        let mut puzzle = Puzzle::new(vec![stub_piece(0, [false; 4]), stub_piece(1, [false; 4])]);
        // Piece 1 meets piece 0's right side with its edge 0.
        assert!(puzzle.connect(er(0, 1), er(1, 0)));
        LayoutResolver::new().resolve(&mut puzzle);
        let (x, y, r) = placement(&puzzle, 1).expect("placed");
        assert_eq!((x, y), (1, 0));
        assert_eq!(r, 1);
        // Walking back from piece 1 must land on piece 0's cell.
        let back = facing(0, QuarterTurn::new(r));
        assert_eq!(back, Direction::Left);
    }

    #[test]
    fn unreached_pieces_stay_unplaced() {
        let mut puzzle = Puzzle::new(vec![
            stub_piece(0, [false; 4]),
            stub_piece(1, [false; 4]),
            stub_piece(2, [false; 4]),
        ]);
        assert!(puzzle.connect(er(1, 2), er(2, 0)));
        let layout = LayoutResolver::new().resolve(&mut puzzle);
        assert_eq!(layout.anchor, Some(PieceId(1)));
        assert_eq!(layout.unplaced, vec![PieceId(0)]);
        assert_eq!(placement(&puzzle, 2), Some((0, -1, 0)));
        assert!(placement(&puzzle, 0).is_none());
    }

    #[test]
    fn empty_puzzle_has_no_anchor() {
        let mut puzzle = Puzzle::new(Vec::new());
        assert_eq!(LayoutResolver::new().resolve(&mut puzzle), Layout::default());
    }
}
