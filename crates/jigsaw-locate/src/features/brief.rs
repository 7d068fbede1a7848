use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use nalgebra::{Point2, Rotation2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fast::{detect_fast, FastConfig};
use super::{Descriptor, FeatureExtractor, Keypoint};

/// Sampling points stay inside this disc so that any rotation of the
/// pattern still fits the patch.
const PATTERN_RADIUS: f32 = 13.0;
const PATTERN_SEED: u64 = 0x4252_4945_46;
/// Gaussian pre-smoothing applied before sampling.
pub(crate) const SMOOTHING_SIGMA: f32 = 2.0;

/// Integer offset pairs `(a, b)`; bit `i` is set when `I(a_i) < I(b_i)`.
pub type Offsets = Vec<[(i32, i32); 2]>;

/// Fixed random BRIEF test pattern.
#[derive(Clone, Debug)]
pub struct BriefPattern {
    pairs: Vec<[Point2<f32>; 2]>,
}

impl Default for BriefPattern {
    fn default() -> Self {
        Self::random(PATTERN_SEED)
    }
}

impl BriefPattern {
    /// 256 point pairs drawn from an isotropic bell around the centre.
    pub fn random(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = (0..Descriptor::BITS)
            .map(|_| loop {
                let a = draw_point(&mut rng);
                let b = draw_point(&mut rng);
                if a != b {
                    break [a, b];
                }
            })
            .collect();
        Self { pairs }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pattern turned by `angle` radians, rounded to pixel offsets.
    pub fn offsets(&self, angle: f32) -> Offsets {
        let rot = Rotation2::new(angle);
        let snap = |p: Point2<f32>| {
            let q = rot * p;
            (q.x.round() as i32, q.y.round() as i32)
        };
        self.pairs.iter().map(|[a, b]| [snap(*a), snap(*b)]).collect()
    }
}

/// Sum of three uniforms has unit variance; scaled to a fifth of the patch.
fn draw_point(rng: &mut StdRng) -> Point2<f32> {
    const SIGMA: f32 = 6.0;
    loop {
        let mut coord = || (0..3).map(|_| rng.gen_range(-1.0f32..1.0)).sum::<f32>() * SIGMA;
        let p = Point2::new(coord().round(), coord().round());
        if p.coords.norm() <= PATTERN_RADIUS {
            return p;
        }
    }
}

/// Evaluate the binary tests of `offsets` around `kp` on a smoothed image.
pub(crate) fn sample_descriptor(smoothed: &GrayImage, kp: &Keypoint, offsets: &Offsets) -> Descriptor {
    let (w, h) = smoothed.dimensions();
    let at = |(dx, dy): (i32, i32)| {
        let x = (kp.x.round() as i32 + dx).clamp(0, w as i32 - 1) as u32;
        let y = (kp.y.round() as i32 + dy).clamp(0, h as i32 - 1) as u32;
        smoothed.get_pixel(x, y).0[0]
    };
    let mut d = Descriptor::default();
    for (i, [a, b]) in offsets.iter().enumerate() {
        if at(*a) < at(*b) {
            d.set_bit(i);
        }
    }
    d
}

/// FAST-9 keypoints with plain (unsteered) BRIEF-256 descriptors.
#[derive(Clone, Debug)]
pub struct FastBrief {
    fast: FastConfig,
    offsets: Offsets,
}

impl FastBrief {
    pub fn new(fast: FastConfig) -> Self {
        Self {
            fast,
            offsets: BriefPattern::default().offsets(0.0),
        }
    }
}

impl Default for FastBrief {
    fn default() -> Self {
        Self::new(FastConfig::default())
    }
}

impl FeatureExtractor for FastBrief {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        detect_fast(image, &self.fast)
    }

    fn describe(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Descriptor> {
        if keypoints.is_empty() {
            return Vec::new();
        }
        let smoothed = gaussian_blur_f32(image, SMOOTHING_SIGMA);
        keypoints
            .iter()
            .map(|kp| sample_descriptor(&smoothed, kp, &self.offsets))
            .collect()
    }
}
