//! Canvas composition of placed pieces.

use image::{Rgb, RgbImage};
use jigsaw_core::{sample_bilinear_rgb, GridCell};
use log::debug;
use nalgebra::{Point2, Rotation2, Vector2};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::ComposeParams;
use crate::piece::{Piece, Placement};
use crate::puzzle::Puzzle;

/// On-screen rotation (degrees, image coordinates with y down) that brings a
/// piece upright in its cell: undoes the continuous tilt and the discrete
/// grid rotation at once.
///
/// An unrotated piece whose edge 0 already points down (tilt 90) needs none.
#[inline]
pub fn upright_rotation_degrees(placement: &Placement, tilt: f64) -> f64 {
    90.0 * (placement.rotation.turns() + 1) as f64 - tilt
}

/// Pastes every placed piece into a grid-shaped canvas.
#[derive(Clone, Debug, Default)]
pub struct CanvasComposer {
    params: ComposeParams,
}

impl CanvasComposer {
    pub fn new(params: ComposeParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ComposeParams {
        &self.params
    }

    /// Render the solved layout. `None` when no piece has a placement.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn compose(&self, puzzle: &Puzzle) -> Option<RgbImage> {
        let placed: Vec<(&Piece, Placement)> = puzzle
            .pieces()
            .iter()
            .filter_map(|p| p.placement.map(|pl| (p, pl)))
            .collect();
        let first = placed.first()?.1.cell;
        let (min, max) = placed.iter().fold((first, first), |(lo, hi), (_, pl)| {
            (
                GridCell::new(lo.x.min(pl.cell.x), lo.y.min(pl.cell.y)),
                GridCell::new(hi.x.max(pl.cell.x), hi.y.max(pl.cell.y)),
            )
        });

        let pitch = self.params.cell_pitch.max(1);
        let pad = self.params.padding;
        let cols = (max.x - min.x + 1) as u32;
        let rows = (max.y - min.y + 1) as u32;
        let mut canvas = RgbImage::from_pixel(
            cols * pitch + 2 * pad,
            rows * pitch + 2 * pad,
            Rgb(self.params.background),
        );

        for (piece, pl) in &placed {
            let center = Point2::new(
                (pad + (pl.cell.x - min.x) as u32 * pitch + pitch / 2) as f32,
                (pad + (pl.cell.y - min.y) as u32 * pitch + pitch / 2) as f32,
            );
            let angle = upright_rotation_degrees(pl, piece.tilt);
            debug!(
                "pasting {} at ({}, {}) turned {:.1} deg",
                piece.id, pl.cell.x, pl.cell.y, angle
            );
            paste_rotated(&mut canvas, piece, center, angle);
        }
        Some(canvas)
    }
}

/// Rotate `piece` by `degrees` about its rounded contour centroid and paste
/// the silhouette pixels so that the centroid lands on `center`.
fn paste_rotated(canvas: &mut RgbImage, piece: &Piece, center: Point2<f32>, degrees: f64) {
    let Some(c) = piece.centroid() else {
        return;
    };
    let pivot = Point2::new(c.x.round() as f32, c.y.round() as f32);
    let fwd = Rotation2::new(degrees.to_radians() as f32);
    let inv = fwd.inverse();

    // Destination window: forward image of the crop rectangle.
    let (w, h) = piece.image.dimensions();
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w as f32, 0.0),
        Point2::new(w as f32, h as f32),
        Point2::new(0.0, h as f32),
    ];
    let mapped = corners.map(|p| center + fwd * (p - pivot));
    let lo_x = mapped.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor() - 1.0;
    let hi_x = mapped.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() + 1.0;
    let lo_y = mapped.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor() - 1.0;
    let hi_y = mapped.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() + 1.0;

    let (cw, ch) = canvas.dimensions();
    let x0 = lo_x.max(0.0) as u32;
    let y0 = lo_y.max(0.0) as u32;
    let x1 = (hi_x.max(0.0) as u32).min(cw);
    let y1 = (hi_y.max(0.0) as u32).min(ch);

    for y in y0..y1 {
        for x in x0..x1 {
            let v = Vector2::new(x as f32 - center.x, y as f32 - center.y);
            let src = snap(pivot + inv * v);
            if !in_mask(piece, src) {
                continue;
            }
            if let Some(px) = sample_bilinear_rgb(&piece.image, src.x, src.y) {
                canvas.put_pixel(x, y, px);
            }
        }
    }
}

/// Pull coordinates within rounding noise of an integer onto it, so exact
/// quarter turns do not lose the last row or column.
fn snap(p: Point2<f32>) -> Point2<f32> {
    let s = |v: f32| {
        let r = v.round();
        if (v - r).abs() < 1e-3 {
            r
        } else {
            v
        }
    };
    Point2::new(s(p.x), s(p.y))
}

fn in_mask(piece: &Piece, p: Point2<f32>) -> bool {
    let (x, y) = (p.x.round(), p.y.round());
    if x < 0.0 || y < 0.0 {
        return false;
    }
    let (x, y) = (x as u32, y as u32);
    x < piece.mask.width() && y < piece.mask.height() && piece.mask.get_pixel(x, y).0[0] > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceId;
    use image::{GrayImage, Luma};
    use jigsaw_core::QuarterTurn;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn textured_piece(id: usize, w: u32, h: u32, seed: u64) -> Piece {
        let mut rng = StdRng::seed_from_u64(seed);
        let image = RgbImage::from_fn(w, h, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]));
        let mask = GrayImage::from_pixel(w, h, Luma([255]));
        let (r, b) = ((w - 1) as f64, (h - 1) as f64);
        let contour = vec![
            Point2::new(0.0, b),
            Point2::new(r, b),
            Point2::new(r, 0.0),
            Point2::new(0.0, 0.0),
        ];
        Piece::new(PieceId(id), [0, 0], image, mask, contour)
    }

    fn place(piece: &mut Piece, x: i32, y: i32, r: i32, tilt: f64) {
        piece.tilt = tilt;
        piece.placement = Some(Placement {
            cell: GridCell::new(x, y),
            rotation: QuarterTurn::new(r),
        });
    }

    fn composer() -> CanvasComposer {
        CanvasComposer::new(ComposeParams {
            cell_pitch: 64,
            padding: 8,
            background: [0, 0, 0],
        })
    }

    #[test]
    fn upright_piece_round_trips() {
        let mut piece = textured_piece(0, 41, 31, 7);
        place(&mut piece, 0, 0, 0, 90.0);
        let original = piece.image.clone();
        let canvas = composer().compose(&Puzzle::new(vec![piece])).expect("canvas");
        assert_eq!(canvas.dimensions(), (80, 80));

        // Centroid (20, 15) lands on the cell centre (40, 40).
        let (ox, oy) = (20, 25);
        for (x, y, px) in original.enumerate_pixels() {
            assert_eq!(canvas.get_pixel(x + ox, y + oy), px, "pixel ({x}, {y})");
        }
        assert_eq!(*canvas.get_pixel(ox - 1, oy), Rgb([0, 0, 0]));
    }

    #[test]
    fn half_turn_flips_the_raster() {
        let mut piece = textured_piece(0, 21, 21, 3);
        // Edge 0 pointing up means the piece lies upside down.
        place(&mut piece, 0, 0, 0, 270.0);
        let original = piece.image.clone();
        let canvas = composer().compose(&Puzzle::new(vec![piece])).expect("canvas");
        // Pivot (10, 10) lands on the cell centre (40, 40), mirrored through it.
        for (x, y, px) in original.enumerate_pixels() {
            let cx = 40 - (x as i32 - 10);
            let cy = 40 - (y as i32 - 10);
            assert_eq!(canvas.get_pixel(cx as u32, cy as u32), px, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn canvas_spans_all_placed_cells() {
        let mut a = textured_piece(0, 10, 10, 1);
        let mut b = textured_piece(1, 10, 10, 2);
        let c = textured_piece(2, 10, 10, 3);
        place(&mut a, -1, 0, 0, 90.0);
        place(&mut b, 1, 2, 0, 90.0);
        let canvas = composer()
            .compose(&Puzzle::new(vec![a, b, c]))
            .expect("canvas");
        assert_eq!(canvas.dimensions(), (3 * 64 + 16, 3 * 64 + 16));
    }

    #[test]
    fn nothing_placed_means_no_canvas() {
        let piece = textured_piece(0, 10, 10, 1);
        assert!(composer().compose(&Puzzle::new(vec![piece])).is_none());
    }

    #[test]
    fn rotation_formula() {
        let pl = Placement {
            cell: GridCell::ORIGIN,
            rotation: QuarterTurn::new(1),
        };
        assert_eq!(upright_rotation_degrees(&pl, 180.0), 0.0);
        assert_eq!(upright_rotation_degrees(&pl, 90.0), 90.0);
    }
}
