//! Debug rendering of a modeled piece.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_filled_circle_mut, draw_line_segment_mut};
use nalgebra::Point2;

use crate::piece::Piece;

const FLAT: Rgb<u8> = Rgb([0, 220, 0]);
const SHAPED: Rgb<u8> = Rgb([230, 30, 30]);
const CORNER: Rgb<u8> = Rgb([40, 120, 255]);
const TILT: Rgb<u8> = Rgb([255, 230, 0]);
const LINKED: Rgb<u8> = Rgb([255, 255, 255]);

/// Copy of the piece raster with its edges drawn on top: flat edges green,
/// tabs and blanks red, corners as blue crosses, the tilt direction as a
/// yellow line from the centroid to edge 0, and a white dot on every
/// connected edge.
pub fn annotate_piece(piece: &Piece) -> RgbImage {
    let mut out = piece.image.clone();
    for edge in &piece.edges {
        let colour = if edge.flat { FLAT } else { SHAPED };
        for seg in edge.curve.windows(2) {
            draw_line_segment_mut(&mut out, to_f32(seg[0]), to_f32(seg[1]), colour);
        }
    }
    for edge in &piece.edges {
        if let Some(p) = edge.start() {
            draw_cross_mut(&mut out, CORNER, p.x.round() as i32, p.y.round() as i32);
        }
        if edge.connection.is_some() {
            if let Some(m) = edge.midpoint() {
                draw_filled_circle_mut(&mut out, (m.x.round() as i32, m.y.round() as i32), 3, LINKED);
            }
        }
    }
    if let (Some(c), Some(m)) = (piece.centroid(), piece.edges.first().and_then(|e| e.midpoint())) {
        draw_line_segment_mut(&mut out, to_f32(c), to_f32(m), TILT);
    }
    out
}

#[inline]
fn to_f32(p: Point2<f64>) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}
