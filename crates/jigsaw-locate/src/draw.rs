//! Outline and match rendering.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use nalgebra::{Point2, Vector2};

use crate::locator::Localization;
use crate::params::OutlineStyle;

const INLIER: Rgb<u8> = Rgb([0, 200, 255]);
const OUTLIER: Rgb<u8> = Rgb([255, 60, 60]);

/// Closed quadrilateral through `corners`, `style.thickness` pixels wide.
pub fn draw_outline(image: &mut RgbImage, corners: &[Point2<f32>; 4], style: &OutlineStyle) {
    for i in 0..4 {
        thick_line(image, corners[i], corners[(i + 1) % 4], style.thickness, Rgb(style.color));
    }
}

fn thick_line(image: &mut RgbImage, a: Point2<f32>, b: Point2<f32>, thickness: u32, colour: Rgb<u8>) {
    let d = b - a;
    let len = d.norm();
    if !len.is_finite() || len < 1e-6 {
        return;
    }
    let n = Vector2::new(-d.y, d.x) / len;
    let t = thickness.max(1) as f32;
    // Parallel strokes half a pixel apart cover the band without gaps.
    let steps = (2.0 * t) as i32;
    for k in 0..steps.max(1) {
        let off = n * ((k as f32 + 0.5) * 0.5 - t / 2.0);
        draw_line_segment_mut(image, (a.x + off.x, a.y + off.y), (b.x + off.x, b.y + off.y), colour);
    }
}

/// Template and scene side by side, good matches joined by lines (inliers
/// and outliers in different colours) and the located outline drawn over
/// the scene half.
pub fn render_matches(
    template: &RgbImage,
    scene: &RgbImage,
    loc: &Localization,
    style: &OutlineStyle,
) -> RgbImage {
    let (tw, th) = template.dimensions();
    let (sw, sh) = scene.dimensions();
    let mut out = RgbImage::new(tw + sw, th.max(sh));
    image::imageops::replace(&mut out, template, 0, 0);
    image::imageops::replace(&mut out, scene, tw as i64, 0);

    let shift = tw as f32;
    for (m, &inlier) in loc.good_matches.iter().zip(loc.inliers.iter()) {
        let (Some(q), Some(t)) = (
            loc.template_keypoints.get(m.query),
            loc.scene_keypoints.get(m.train),
        ) else {
            continue;
        };
        let colour = if inlier { INLIER } else { OUTLIER };
        draw_hollow_circle_mut(&mut out, (q.x as i32, q.y as i32), 3, colour);
        draw_hollow_circle_mut(&mut out, ((t.x + shift) as i32, t.y as i32), 3, colour);
        draw_line_segment_mut(&mut out, (q.x, q.y), (t.x + shift, t.y), colour);
    }
    let shifted = loc.corners.map(|c| Point2::new(c.x + shift, c.y));
    draw_outline(&mut out, &shifted, style);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_drawn_with_thickness() {
        let mut img = RgbImage::new(60, 60);
        let corners = [
            Point2::new(10.0, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        ];
        let style = OutlineStyle {
            color: [0, 255, 0],
            thickness: 4,
        };
        draw_outline(&mut img, &corners, &style);
        let green = Rgb([0, 255, 0]);
        assert_eq!(*img.get_pixel(30, 10), green);
        assert_eq!(*img.get_pixel(30, 9), green);
        assert_eq!(*img.get_pixel(30, 11), green);
        assert_eq!(*img.get_pixel(50, 30), green);
        // Interior untouched.
        assert_eq!(*img.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_side_is_skipped() {
        let mut img = RgbImage::new(10, 10);
        let p = Point2::new(5.0, 5.0);
        draw_outline(&mut img, &[p; 4], &OutlineStyle::default());
        assert!(img.pixels().all(|px| *px == Rgb([0, 0, 0])));
    }
}
