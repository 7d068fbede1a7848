//! Piece segmentation: blur, binarize, trace outer borders, crop.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::box_filter;
use imageproc::point::Point;
use jigsaw_core::{crop_gray, crop_rgb, ensure_counter_clockwise_on_screen};
use log::{debug, info};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SegmenterParams;
use crate::piece::{Piece, PieceId};

/// Extracts one [`Piece`] per outermost foreground blob.
#[derive(Clone, Debug, Default)]
pub struct Segmenter {
    params: SegmenterParams,
}

impl Segmenter {
    pub fn new(params: SegmenterParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Binary foreground of `scene` after blurring (255 = foreground).
    pub fn foreground(&self, scene: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(scene);
        let smoothed = if self.params.blur_radius > 0 {
            box_filter(&gray, self.params.blur_radius, self.params.blur_radius)
        } else {
            gray
        };
        let thr = self.params.foreground_threshold;
        GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
            if smoothed.get_pixel(x, y).0[0] > thr {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// Segment `scene` into pieces. Ids follow contour discovery order
    /// (raster order of each blob's first border pixel); blobs below
    /// `min_extent` are skipped.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene), fields(w = scene.width(), h = scene.height()))
    )]
    pub fn segment(&self, scene: &RgbImage) -> Vec<Piece> {
        let binary = self.foreground(scene);
        let contours: Vec<Contour<i32>> = find_contours(&binary);

        let mut pieces = Vec::new();
        let mut skipped = 0usize;
        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            match self.cut_piece(scene, &binary, &contour.points, PieceId(pieces.len())) {
                Some(piece) => pieces.push(piece),
                None => skipped += 1,
            }
        }

        info!(
            "segmented {} pieces ({} tiny blobs skipped)",
            pieces.len(),
            skipped
        );
        pieces
    }

    fn cut_piece(
        &self,
        scene: &RgbImage,
        binary: &GrayImage,
        points: &[Point<i32>],
        id: PieceId,
    ) -> Option<Piece> {
        let first = points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in points {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let width = (x1 - x0 + 1) as u32;
        let height = (y1 - y0 + 1) as u32;
        if points.len() < 3 || width < self.params.min_extent || height < self.params.min_extent {
            debug!("skipping blob at ({x0},{y0}) of {width}x{height}");
            return None;
        }

        let (ox, oy) = (x0 as u32, y0 as u32);
        let image = crop_rgb(scene, ox, oy, width, height);
        let mask = silhouette(binary, points, [x0, y0], width, height);

        let mut contour: Vec<Point2<f64>> = points
            .iter()
            .map(|p| Point2::new((p.x - x0) as f64, (p.y - y0) as f64))
            .collect();
        ensure_counter_clockwise_on_screen(&mut contour);

        Some(Piece::new(id, [ox, oy], image, mask, contour))
    }
}

/// Foreground pixels of the crop that lie inside (or on) the blob outline.
/// Other blobs reaching into the bounding box are left out.
fn silhouette(
    binary: &GrayImage,
    points: &[Point<i32>],
    origin: [i32; 2],
    width: u32,
    height: u32,
) -> GrayImage {
    let mut inside = GrayImage::new(width, height);
    let local: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x - origin[0], p.y - origin[1]))
        .collect();

    // `draw_polygon_mut` rejects an explicitly closed outline.
    let open = match (local.first(), local.last()) {
        (Some(a), Some(b)) if a == b => &local[..local.len() - 1],
        _ => &local[..],
    };
    if open.len() >= 3 {
        draw_polygon_mut(&mut inside, open, Luma([255]));
    }
    for p in &local {
        inside.put_pixel(p.x as u32, p.y as u32, Luma([255]));
    }

    let fg = crop_gray(binary, origin[0] as u32, origin[1] as u32, width, height);
    GrayImage::from_fn(width, height, |x, y| {
        if inside.get_pixel(x, y).0[0] > 0 && fg.get_pixel(x, y).0[0] > 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use jigsaw_core::signed_area;

    fn scene_with_rects(rects: &[(u32, u32, u32, u32)]) -> RgbImage {
        let mut img = RgbImage::new(120, 80);
        for &(x, y, w, h) in rects {
            for j in y..y + h {
                for i in x..x + w {
                    img.put_pixel(i, j, Rgb([200, 120, 40]));
                }
            }
        }
        img
    }

    fn unblurred() -> Segmenter {
        Segmenter::new(SegmenterParams {
            blur_radius: 0,
            ..SegmenterParams::default()
        })
    }

    #[test]
    fn finds_each_blob_with_local_contour() {
        let scene = scene_with_rects(&[(10, 10, 30, 20), (60, 40, 25, 25)]);
        let pieces = unblurred().segment(&scene);
        assert_eq!(pieces.len(), 2);

        let a = &pieces[0];
        assert_eq!(a.id, PieceId(0));
        assert_eq!(a.origin, [10, 10]);
        assert_eq!(a.image.dimensions(), (30, 20));
        assert_eq!(a.mask.dimensions(), (30, 20));
        assert!(a.contour.iter().all(|p| p.x >= 0.0 && p.y >= 0.0 && p.x < 30.0 && p.y < 20.0));
        assert!(signed_area(&a.contour) < 0.0);
        assert!(a.mask.pixels().all(|p| p.0[0] == 255));

        assert_eq!(pieces[1].origin, [60, 40]);
    }

    #[test]
    fn nested_blobs_are_ignored_and_tiny_ones_skipped() {
        let mut scene = scene_with_rects(&[(10, 10, 40, 40), (80, 10, 1, 1)]);
        // Punch a hole with an island inside the first blob.
        for j in 20..40 {
            for i in 20..40 {
                scene.put_pixel(i, j, Rgb([0, 0, 0]));
            }
        }
        for j in 25..30 {
            for i in 25..30 {
                scene.put_pixel(i, j, Rgb([90, 90, 90]));
            }
        }
        let pieces = unblurred().segment(&scene);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].origin, [10, 10]);
    }

    #[test]
    fn mask_excludes_neighbouring_blobs() {
        // An L-shaped blob whose bounding box contains a separate square.
        let scene = scene_with_rects(&[(10, 10, 40, 6), (10, 10, 6, 40), (30, 30, 8, 8)]);
        let pieces = unblurred().segment(&scene);
        assert_eq!(pieces.len(), 2);
        let l = &pieces[0];
        assert_eq!(l.mask.get_pixel(22, 22).0[0], 0);
        assert_eq!(l.mask.get_pixel(2, 2).0[0], 255);
    }

    #[test]
    fn empty_scene_yields_nothing() {
        assert!(Segmenter::default().segment(&RgbImage::new(16, 16)).is_empty());
    }
}
