//! Connectivity groups: union-find over piece indices.

use crate::piece::PieceId;

/// Disjoint sets of rigidly connected pieces.
#[derive(Clone, Debug, Default)]
pub struct PieceGroups {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl PieceGroups {
    /// `n` singleton groups.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `piece`'s group, or `None` for an unknown id.
    pub fn find(&mut self, piece: PieceId) -> Option<usize> {
        let mut x = piece.0;
        if x >= self.parent.len() {
            return None;
        }
        // Path halving.
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        Some(x)
    }

    /// Merge the groups of `a` and `b`. Returns `false` if they were already
    /// merged or either id is unknown.
    pub fn union(&mut self, a: PieceId, b: PieceId) -> bool {
        let (Some(ra), Some(rb)) = (self.find(a), self.find(b)) else {
            return false;
        };
        if ra == rb {
            return false;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }

    pub fn same_group(&mut self, a: PieceId, b: PieceId) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// Number of pieces in `piece`'s group (0 for an unknown id).
    pub fn group_size(&mut self, piece: PieceId) -> usize {
        self.find(piece).map_or(0, |r| self.size[r])
    }

    /// Back to singletons.
    pub fn reset(&mut self) {
        for (i, p) in self.parent.iter_mut().enumerate() {
            *p = i;
        }
        self.size.fill(1);
    }
}
