//! Brute-force descriptor matching and good-match selection.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::features::Descriptor;
use crate::params::{AdaptiveThreshold, MatchMetric, ThresholdPolicy};

/// Best scene descriptor for one template descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatch {
    /// Index into the template keypoints.
    pub query: usize,
    /// Index into the scene keypoints.
    pub train: usize,
    pub distance: f32,
}

/// Match capability: one match per query descriptor that has any
/// candidate.
pub trait DescriptorMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch>;
}

/// Exhaustive nearest neighbour under a binary metric.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForceMatcher {
    metric: MatchMetric,
}

impl BruteForceMatcher {
    pub fn new(metric: MatchMetric) -> Self {
        Self { metric }
    }

    #[inline]
    pub fn distance(&self, a: &Descriptor, b: &Descriptor) -> u32 {
        match self.metric {
            MatchMetric::Hamming => a.hamming(b),
            MatchMetric::Hamming2 => a.hamming2(b),
        }
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
        query
            .iter()
            .enumerate()
            .filter_map(|(qi, q)| {
                // First minimum wins.
                let (ti, d) = train
                    .iter()
                    .enumerate()
                    .map(|(ti, t)| (ti, self.distance(q, t)))
                    .fold(None, |best: Option<(usize, u32)>, (ti, d)| match best {
                        Some((_, bd)) if bd <= d => best,
                        _ => Some((ti, d)),
                    })?;
                Some(FeatureMatch {
                    query: qi,
                    train: ti,
                    distance: d as f32,
                })
            })
            .collect()
    }
}

/// Decides the largest distance a good match may have, given the smallest
/// and largest distances among all matches.
pub trait MatchThreshold {
    fn threshold(&self, min_distance: f32, max_distance: f32) -> f32;
}

impl MatchThreshold for AdaptiveThreshold {
    fn threshold(&self, min_distance: f32, max_distance: f32) -> f32 {
        let t = (self.multiplier * min_distance).min(self.ceiling);
        if t > max_distance {
            self.fallback_multiplier * min_distance
        } else {
            t
        }
    }
}

/// Constant cut-off, ignoring the observed distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedThreshold(pub f32);

impl MatchThreshold for FixedThreshold {
    fn threshold(&self, _min_distance: f32, _max_distance: f32) -> f32 {
        self.0
    }
}

impl ThresholdPolicy {
    pub fn build(&self) -> Box<dyn MatchThreshold> {
        match self {
            ThresholdPolicy::Adaptive(a) => Box::new(a.clone()),
            ThresholdPolicy::Fixed { max_distance } => Box::new(FixedThreshold(*max_distance)),
        }
    }
}

/// Matches at or below the policy threshold, plus the threshold used.
/// `None` when there are no matches at all.
pub fn select_good_matches(
    matches: &[FeatureMatch],
    policy: &dyn MatchThreshold,
) -> Option<(Vec<FeatureMatch>, f32)> {
    let first = matches.first()?.distance;
    let (min, max) = matches
        .iter()
        .fold((first, first), |(lo, hi), m| (lo.min(m.distance), hi.max(m.distance)));
    let threshold = policy.threshold(min, max);
    debug!("match distances in [{min}, {max}], threshold {threshold}");
    let good = matches
        .iter()
        .filter(|m| m.distance <= threshold)
        .copied()
        .collect();
    Some((good, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(distance: f32) -> FeatureMatch {
        FeatureMatch {
            query: 0,
            train: 0,
            distance,
        }
    }

    #[test]
    fn adaptive_threshold_rules() {
        let policy = AdaptiveThreshold::default();
        // 3x the minimum.
        assert_eq!(policy.threshold(10.0, 80.0), 30.0);
        // Clamped to the ceiling.
        assert_eq!(policy.threshold(40.0, 120.0), 75.0);
        // Above the largest distance: tighter multiple.
        assert_eq!(policy.threshold(10.0, 25.0), 20.0);
        // Exact matches only when the best is perfect.
        assert_eq!(policy.threshold(0.0, 90.0), 0.0);
    }

    #[test]
    fn good_matches_are_filtered_by_policy() {
        let matches = vec![m(4.0), m(30.0), m(12.0), m(13.0)];
        let (good, thr) = select_good_matches(&matches, &AdaptiveThreshold::default()).expect("some");
        assert_eq!(thr, 12.0);
        assert_eq!(good.len(), 2);
        let (good, _) = select_good_matches(&matches, &FixedThreshold(100.0)).expect("some");
        assert_eq!(good.len(), 4);
        assert!(select_good_matches(&[], &FixedThreshold(1.0)).is_none());
    }

    #[test]
    fn brute_force_picks_nearest_and_first_on_ties() {
        let q = [Descriptor([0b1111, 0, 0, 0])];
        let t = [
            Descriptor([0, 0, 0, 0]),
            Descriptor([0b0111, 0, 0, 0]),
            Descriptor([0b1110, 0, 0, 0]),
        ];
        let out = BruteForceMatcher::default().match_descriptors(&q, &t);
        assert_eq!(out, vec![FeatureMatch { query: 0, train: 1, distance: 1.0 }]);
        assert!(BruteForceMatcher::default().match_descriptors(&q, &[]).is_empty());
    }

    #[test]
    fn hamming2_metric_is_used() {
        let q = [Descriptor([0b11, 0, 0, 0])];
        let t = [Descriptor([0, 0, 0, 0])];
        let out = BruteForceMatcher::new(MatchMetric::Hamming2).match_descriptors(&q, &t);
        assert_eq!(out[0].distance, 1.0);
    }
}
