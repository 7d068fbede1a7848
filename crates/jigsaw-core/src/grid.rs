use serde::{Deserialize, Serialize};

/// Integer cell on the reconstructed puzzle grid (`x` grows right, `y` grows down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const ORIGIN: GridCell = GridCell { x: 0, y: 0 };

    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step towards `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> GridCell {
        let [dx, dy] = dir.offset();
        GridCell::new(self.x + dx, self.y + dy)
    }
}

/// Side of a grid cell, numbered the way the layout resolver reasons about
/// edges: `0 = up, 1 = left, 2 = down, 3 = right`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Map any integer onto a direction, modulo 4.
    #[inline]
    pub fn from_index(i: i32) -> Direction {
        Self::ALL[i.rem_euclid(4) as usize]
    }

    #[inline]
    pub fn index(self) -> i32 {
        match self {
            Direction::Up => 0,
            Direction::Left => 1,
            Direction::Down => 2,
            Direction::Right => 3,
        }
    }

    #[inline]
    pub fn offset(self) -> [i32; 2] {
        match self {
            Direction::Up => [0, -1],
            Direction::Left => [-1, 0],
            Direction::Down => [0, 1],
            Direction::Right => [1, 0],
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::from_index(self.index() + 2)
    }
}

/// Discrete piece rotation in quarter turns, always in `0..4`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterTurn(u8);

impl QuarterTurn {
    pub const ZERO: QuarterTurn = QuarterTurn(0);

    /// Build a rotation from any integer number of quarter turns, modulo 4.
    #[inline]
    pub fn new(turns: i32) -> Self {
        Self(turns.rem_euclid(4) as u8)
    }

    #[inline]
    pub fn turns(self) -> i32 {
        self.0 as i32
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        90.0 * self.0 as f64
    }
}
