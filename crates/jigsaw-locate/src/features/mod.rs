//! Keypoint detection and binary description.
//!
//! Both strategies share the FAST-9 detector in [`fast`]; they differ in
//! whether the BRIEF sampling pattern is steered by the keypoint
//! orientation.

mod brief;
mod fast;
mod orb;

pub use brief::{BriefPattern, FastBrief};
pub use fast::{detect_fast, FastConfig};
pub use orb::{intensity_centroid_angle, Orb};

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::params::{FeatureKind, LocatorParams};

/// Half size of the square patch a descriptor reads from.
pub const PATCH_RADIUS: u32 = 15;

/// Keypoints closer than this to the image border are dropped, so every
/// descriptor sees only pixels unaffected by border handling of the blur.
pub const EDGE_MARGIN: u32 = 24;

/// A detected image feature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Detector response; larger is stronger.
    pub response: f32,
    /// Orientation in radians (0 when the strategy is not rotation aware).
    pub angle: f32,
}

/// 256-bit binary descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    pub const BITS: usize = 256;

    #[inline]
    pub fn set_bit(&mut self, i: usize) {
        self.0[i / 64] |= 1u64 << (i % 64);
    }

    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        self.0[i / 64] >> (i % 64) & 1 == 1
    }

    /// Number of differing bits.
    #[inline]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Number of differing aligned bit pairs.
    #[inline]
    pub fn hamming2(&self, other: &Descriptor) -> u32 {
        const LOW: u64 = 0x5555_5555_5555_5555;
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let v = a ^ b;
                ((v | (v >> 1)) & LOW).count_ones()
            })
            .sum()
    }
}

/// Detect-and-describe capability.
pub trait FeatureExtractor {
    /// Keypoints of `image`, strongest first, all at least
    /// [`EDGE_MARGIN`] pixels inside the border.
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint>;

    /// One descriptor per keypoint, in order.
    fn describe(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Descriptor>;

    fn detect_and_describe(&self, image: &GrayImage) -> (Vec<Keypoint>, Vec<Descriptor>) {
        let keypoints = self.detect(image);
        let descriptors = self.describe(image, &keypoints);
        (keypoints, descriptors)
    }
}

/// Build the extractor selected in `params`.
pub fn extractor_for(params: &LocatorParams) -> Box<dyn FeatureExtractor> {
    let fast = FastConfig {
        threshold: params.fast_threshold,
        max_keypoints: params.max_keypoints,
        ..FastConfig::default()
    };
    match params.features {
        FeatureKind::FastBrief => Box::new(FastBrief::new(fast)),
        FeatureKind::Orb => Box::new(Orb::new(fast)),
    }
}
