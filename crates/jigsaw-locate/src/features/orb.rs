use std::f32::consts::TAU;

use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;

use super::brief::{sample_descriptor, BriefPattern, Offsets, SMOOTHING_SIGMA};
use super::fast::{detect_fast, FastConfig};
use super::{Descriptor, FeatureExtractor, Keypoint, PATCH_RADIUS};

/// Orientation resolution of the precomputed steered patterns (12 degrees).
const ANGLE_BINS: usize = 30;

/// Orientation of the patch around `(x, y)`: direction from the centre to
/// the intensity centroid of the disc of radius [`PATCH_RADIUS`], in
/// radians within `[0, 2pi)`.
pub fn intensity_centroid_angle(image: &GrayImage, x: u32, y: u32) -> f32 {
    let (w, h) = image.dimensions();
    let r = PATCH_RADIUS as i64;
    let (mut m01, mut m10) = (0f64, 0f64);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let px = x as i64 + dx;
            let py = y as i64 + dy;
            if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                continue;
            }
            let v = image.get_pixel(px as u32, py as u32).0[0] as f64;
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    (m01.atan2(m10) as f32).rem_euclid(TAU)
}

/// FAST-9 keypoints with intensity-centroid orientation and BRIEF-256
/// descriptors steered by that orientation.
#[derive(Clone, Debug)]
pub struct Orb {
    fast: FastConfig,
    steered: Vec<Offsets>,
}

impl Orb {
    pub fn new(fast: FastConfig) -> Self {
        let pattern = BriefPattern::default();
        let steered = (0..ANGLE_BINS)
            .map(|b| pattern.offsets(b as f32 * TAU / ANGLE_BINS as f32))
            .collect();
        Self { fast, steered }
    }

    fn bin(angle: f32) -> usize {
        let step = TAU / ANGLE_BINS as f32;
        (angle.rem_euclid(TAU) / step).round() as usize % ANGLE_BINS
    }
}

impl Default for Orb {
    fn default() -> Self {
        Self::new(FastConfig::default())
    }
}

impl FeatureExtractor for Orb {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let mut kps = detect_fast(image, &self.fast);
        for kp in &mut kps {
            kp.angle = intensity_centroid_angle(image, kp.x as u32, kp.y as u32);
        }
        kps
    }

    fn describe(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Descriptor> {
        if keypoints.is_empty() {
            return Vec::new();
        }
        let smoothed = gaussian_blur_f32(image, SMOOTHING_SIGMA);
        keypoints
            .iter()
            .map(|kp| sample_descriptor(&smoothed, kp, &self.steered[Self::bin(kp.angle)]))
            .collect()
    }
}
