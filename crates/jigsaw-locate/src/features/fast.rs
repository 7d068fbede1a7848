use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};

use super::{Keypoint, EDGE_MARGIN};

/// FAST-9 detector settings.
#[derive(Clone, Debug, PartialEq)]
pub struct FastConfig {
    pub threshold: u8,
    pub max_keypoints: usize,
    /// Radius of the non-maximum suppression window.
    pub nms_radius: u32,
    pub margin: u32,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_keypoints: 2000,
            nms_radius: 3,
            margin: EDGE_MARGIN,
        }
    }
}

/// FAST-9 corners after non-maximum suppression, border filtering and
/// truncation to the strongest `max_keypoints`.
///
/// Suppression runs before the border filter so that a corner's fate
/// depends only on its own neighbourhood, whether the image is a crop or
/// the whole scene.
pub fn detect_fast(image: &GrayImage, cfg: &FastConfig) -> Vec<Keypoint> {
    let (w, h) = image.dimensions();
    if w <= 2 * cfg.margin || h <= 2 * cfg.margin {
        return Vec::new();
    }
    let mut corners = corners_fast9(image, cfg.threshold);
    // Strongest first; position breaks ties so the order is stable.
    corners.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });
    let kept = suppress(&corners, w, h, cfg.nms_radius);

    kept.into_iter()
        .filter(|c| {
            c.x >= cfg.margin && c.y >= cfg.margin && c.x < w - cfg.margin && c.y < h - cfg.margin
        })
        .take(cfg.max_keypoints)
        .map(|c| Keypoint {
            x: c.x as f32,
            y: c.y as f32,
            response: c.score,
            angle: 0.0,
        })
        .collect()
}

/// Greedy suppression over score-sorted corners: a corner survives unless a
/// stronger one lies within `radius` (Chebyshev distance).
fn suppress(sorted: &[Corner], w: u32, h: u32, radius: u32) -> Vec<Corner> {
    let mut taken = vec![false; (w * h) as usize];
    let mut out = Vec::new();
    let r = radius as i64;
    for c in sorted {
        if taken[(c.y * w + c.x) as usize] {
            continue;
        }
        out.push(*c);
        for dy in -r..=r {
            for dx in -r..=r {
                let x = c.x as i64 + dx;
                let y = c.y as i64 + dy;
                if x >= 0 && y >= 0 && x < w as i64 && y < h as i64 {
                    taken[(y as u32 * w + x as u32) as usize] = true;
                }
            }
        }
    }
    out
}
