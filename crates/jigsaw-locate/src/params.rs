use jigsaw_core::RansacParams;
use serde::{Deserialize, Serialize};

/// Keypoint detector / descriptor pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    /// FAST-9 corners with an unrotated BRIEF descriptor.
    FastBrief,
    /// FAST-9 corners with intensity-centroid orientation and a steered
    /// BRIEF descriptor.
    #[default]
    Orb,
}

/// Distance between binary descriptors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMetric {
    /// Number of differing bits.
    #[default]
    Hamming,
    /// Number of differing bit pairs.
    Hamming2,
}

/// `min(multiplier * min_dist, ceiling)`, or `fallback_multiplier * min_dist`
/// when that exceeds the largest observed distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveThreshold {
    pub multiplier: f32,
    pub ceiling: f32,
    pub fallback_multiplier: f32,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            ceiling: 75.0,
            fallback_multiplier: 2.0,
        }
    }
}

/// How good matches are told apart from the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ThresholdPolicy {
    Adaptive(AdaptiveThreshold),
    Fixed { max_distance: f32 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Adaptive(AdaptiveThreshold::default())
    }
}

/// Colour and width of the projected outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            thickness: 4,
        }
    }
}

/// Parameters for [`crate::Locator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    pub features: FeatureKind,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Strongest keypoints kept per image.
    pub max_keypoints: usize,
    pub metric: MatchMetric,
    pub threshold: ThresholdPolicy,
    pub ransac: RansacParams,
    pub outline: OutlineStyle,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            features: FeatureKind::default(),
            fast_threshold: 20,
            max_keypoints: 2000,
            metric: MatchMetric::default(),
            threshold: ThresholdPolicy::default(),
            ransac: RansacParams::default(),
            outline: OutlineStyle::default(),
        }
    }
}
