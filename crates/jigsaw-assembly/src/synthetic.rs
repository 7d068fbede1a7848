//! Synthetic jigsaw scenes with known solutions.
//!
//! Pieces are squares with rectangular tabs and blanks. Every boundary
//! between two perimeter pieces gets its own tab size, so the tab areas are
//! pairwise distinct and the border matcher has an unambiguous answer. The
//! pieces are scattered over a black backdrop in shuffled order and,
//! optionally, turned by random quarter turns.

use image::{Rgb, RgbImage};
use jigsaw_core::{GridCell, QuarterTurn};
use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Generator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticParams {
    pub rows: u32,
    pub cols: u32,
    /// Side of a piece's square body in pixels.
    pub side: u32,
    /// Empty space between scattered pieces.
    pub gap: u32,
    /// Turn each piece by a random multiple of 90 degrees.
    pub rotate_pieces: bool,
    pub seed: u64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            side: 160,
            gap: 24,
            rotate_pieces: false,
            seed: 7,
        }
    }
}

/// Tab (`depth > 0`), blank (`depth < 0`) or straight side (`depth == 0`),
/// centred on the side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideBump {
    pub depth: i32,
    pub width: u32,
}

impl SideBump {
    pub const FLAT: SideBump = SideBump { depth: 0, width: 0 };

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.depth == 0
    }

    fn complement(self) -> SideBump {
        SideBump {
            depth: -self.depth,
            width: self.width,
        }
    }
}

/// Ground truth for one generated piece.
#[derive(Clone, Debug)]
pub struct SyntheticPiece {
    /// Solved grid cell (`x` = column, `y` = row).
    pub cell: GridCell,
    /// Scene position of the centre of the piece's square body.
    pub scene_center: Point2<f64>,
    /// Quarter turns applied when scattering (clockwise on screen).
    pub turns: QuarterTurn,
    /// Bottom, right, top, left.
    pub sides: [SideBump; 4],
    /// Outline in the piece's own unturned frame, see [`piece_outline`].
    pub outline: Vec<Point2<f64>>,
}

/// A generated scene and its solution.
#[derive(Clone, Debug)]
pub struct SyntheticPuzzle {
    pub params: SyntheticParams,
    pub scene: RgbImage,
    pub pieces: Vec<SyntheticPiece>,
}

impl SyntheticPuzzle {
    /// The ground-truth piece whose body centre is closest to `p` (scene
    /// coordinates).
    pub fn nearest(&self, p: Point2<f64>) -> Option<&SyntheticPiece> {
        self.pieces.iter().min_by(|a, b| {
            let da = (a.scene_center - p).norm_squared();
            let db = (b.scene_center - p).norm_squared();
            da.total_cmp(&db)
        })
    }
}

/// Outline vertices of a `side x side` piece, counter-clockwise on screen,
/// starting at the bottom-left corner `(0, side)`. Sides are given as
/// bottom, right, top, left.
pub fn piece_outline(side: u32, sides: &[SideBump; 4]) -> Vec<Point2<f64>> {
    let s = side as f64;
    let corners = [
        Point2::new(0.0, s),
        Point2::new(s, s),
        Point2::new(s, 0.0),
        Point2::new(0.0, 0.0),
    ];
    let mut pts = Vec::with_capacity(20);
    for (k, bump) in sides.iter().enumerate() {
        let start = corners[k];
        let u: Vector2<f64> = (corners[(k + 1) % 4] - start) / s;
        // Outward normal on screen.
        let n = Vector2::new(-u.y, u.x);
        pts.push(start);
        if !bump.is_flat() {
            let a = ((side - bump.width.min(side)) / 2) as f64;
            let b = a + bump.width as f64;
            let d = bump.depth as f64;
            pts.push(start + u * a);
            pts.push(start + u * a + n * d);
            pts.push(start + u * b + n * d);
            pts.push(start + u * b);
        }
    }
    pts
}

/// Build a `rows x cols` scene.
pub fn generate(params: &SyntheticParams) -> SyntheticPuzzle {
    let rows = params.rows.max(1);
    let cols = params.cols.max(1);
    let side = params.side.max(8);
    let mut rng = StdRng::seed_from_u64(params.seed);

    let sides = assign_sides(rows, cols, side, &mut rng);

    // Local frame: the body sits at `pad` inside a square canvas of side `span`.
    let pad = (side as f64 * 0.2).ceil() as u32 + 1;
    let span = side + 2 * pad;
    let pitch = span + params.gap;
    let mut scene = RgbImage::new(
        cols * pitch + params.gap,
        rows * pitch + params.gap,
    );

    let mut slots: Vec<usize> = (0..(rows * cols) as usize).collect();
    slots.shuffle(&mut rng);

    let full_w = (cols * side) as f64;
    let full_h = (rows * side) as f64;
    let mut pieces = Vec::with_capacity(slots.len());
    for (idx, &slot) in slots.iter().enumerate() {
        let (r, c) = ((idx as u32) / cols, (idx as u32) % cols);
        let (sr, sc) = ((slot as u32) / cols, (slot as u32) % cols);
        let ox = params.gap + sc * pitch;
        let oy = params.gap + sr * pitch;
        let turns = if params.rotate_pieces {
            QuarterTurn::new(rng.gen_range(0..4))
        } else {
            QuarterTurn::ZERO
        };
        let bumps = sides[idx];

        for y in 0..span {
            for x in 0..span {
                let (ux, uy) = unturn(x, y, span, turns);
                let u = ux as i32 - pad as i32;
                let v = uy as i32 - pad as i32;
                if !inside(u, v, side as i32, &bumps) {
                    continue;
                }
                let gx = (c * side) as f64 + u as f64;
                let gy = (r * side) as f64 + v as f64;
                scene.put_pixel(ox + x, oy + y, texture(gx, gy, full_w, full_h));
            }
        }

        let mid = (span - 1) as f64 / 2.0;
        pieces.push(SyntheticPiece {
            cell: GridCell::new(c as i32, r as i32),
            scene_center: Point2::new(ox as f64 + mid, oy as f64 + mid),
            turns,
            sides: bumps,
            outline: piece_outline(side, &bumps),
        });
    }

    SyntheticPuzzle {
        params: params.clone(),
        scene,
        pieces,
    }
}

/// Per piece (row-major) side bumps: frame sides flat, every internal
/// boundary a tab on one piece and the matching blank on the other.
fn assign_sides(rows: u32, cols: u32, side: u32, rng: &mut StdRng) -> Vec<[SideBump; 4]> {
    const BOTTOM: usize = 0;
    const RIGHT: usize = 1;
    const TOP: usize = 2;
    const LEFT: usize = 3;

    let at = |r: u32, c: u32| (r * cols + c) as usize;
    let on_frame = |r: u32, c: u32| r == 0 || c == 0 || r + 1 == rows || c + 1 == cols;

    // (piece a, side of a, piece b, side of b)
    let mut boundaries = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                boundaries.push((at(r, c), RIGHT, at(r, c + 1), LEFT, on_frame(r, c) && on_frame(r, c + 1)));
            }
            if r + 1 < rows {
                boundaries.push((at(r, c), BOTTOM, at(r + 1, c), TOP, on_frame(r, c) && on_frame(r + 1, c)));
            }
        }
    }

    // Evenly spread sizes over the perimeter boundaries, in random order.
    let ring = boundaries.iter().filter(|b| b.4).count();
    let mut ladder: Vec<f64> = (0..ring)
        .map(|k| if ring > 1 { k as f64 / (ring - 1) as f64 } else { 0.5 })
        .collect();
    ladder.shuffle(rng);
    let mut ladder = ladder.into_iter();

    let mut sides = vec![[SideBump::FLAT; 4]; (rows * cols) as usize];
    for (a, sa, b, sb, perimeter) in boundaries {
        let t = if perimeter {
            ladder.next().unwrap_or(0.5)
        } else {
            rng.gen_range(0.0..1.0)
        };
        let bump = SideBump {
            depth: (side as f64 * (0.07 + 0.13 * t)).round().max(1.0) as i32,
            width: (side as f64 * (0.15 + 0.30 * t)).round().max(1.0) as u32,
        };
        let (tab, blank) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
        let (tab_side, blank_side) = if tab == a { (sa, sb) } else { (sb, sa) };
        sides[tab][tab_side] = bump;
        sides[blank][blank_side] = bump.complement();
    }
    sides
}

/// Map a pixel of the turned canvas back to the unturned one.
fn unturn(x: u32, y: u32, span: u32, turns: QuarterTurn) -> (u32, u32) {
    let (mut x, mut y) = (x, y);
    for _ in 0..turns.turns() {
        // Inverse of a clockwise quarter turn (x, y) -> (span - 1 - y, x).
        (x, y) = (y, span - 1 - x);
    }
    (x, y)
}

/// Body-relative pixel `(u, v)` belongs to the piece.
fn inside(u: i32, v: i32, s: i32, sides: &[SideBump; 4]) -> bool {
    let mut hit = (0..s).contains(&u) && (0..s).contains(&v);
    for (k, bump) in sides.iter().enumerate() {
        if bump.is_flat() {
            continue;
        }
        let w = bump.width.min(s as u32) as i32;
        let a = (s - w) / 2;
        let along = a..a + w;
        let d = bump.depth.abs();
        // (coordinate along the side, coordinate across it) and the band
        // occupied by a tab or cut out by a blank.
        let (t, n, tab, blank) = match k {
            0 => (u, v, s..s + d, s - d..s),
            1 => (v, u, s..s + d, s - d..s),
            2 => (u, v, -d..0, 0..d),
            _ => (v, u, -d..0, 0..d),
        };
        if !along.contains(&t) {
            continue;
        }
        if bump.depth > 0 && tab.contains(&n) {
            hit = true;
        } else if bump.depth < 0 && blank.contains(&n) {
            hit = false;
        }
    }
    hit
}

/// Smooth colour ramp with a checker overlay so orientation is visible.
fn texture(gx: f64, gy: f64, w: f64, h: f64) -> Rgb<u8> {
    let fx = (gx / w).clamp(0.0, 1.0);
    let fy = (gy / h).clamp(0.0, 1.0);
    let check = ((gx / 24.0).floor() + (gy / 24.0).floor()) as i64 % 2 == 0;
    let b = if check { 210 } else { 120 };
    Rgb([
        (50.0 + 200.0 * fx) as u8,
        (50.0 + 200.0 * fy) as u8,
        b,
    ])
}
