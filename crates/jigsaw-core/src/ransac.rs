//! RANSAC homography estimation on top of the 4-point and DLT solvers.

use crate::homography::{estimate_homography, homography_from_4pt, Homography};
use log::debug;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Why no consensus model was returned.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RansacError {
    #[error("need at least 4 correspondences, got {0}")]
    TooFewCorrespondences(usize),
    #[error("no minimal sample produced a valid homography")]
    NoModel,
    #[error("best consensus has {inliers} inliers, need {needed}")]
    WeakConsensus { inliers: usize, needed: usize },
}

/// RANSAC settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum reprojection error (pixels) for a correspondence to count as inlier.
    pub reproj_threshold: f32,
    /// Hard cap on hypothesis count.
    pub max_iters: usize,
    /// Desired probability of drawing at least one all-inlier sample.
    pub confidence: f64,
    /// Minimal consensus size accepted as a model (never below 4).
    pub min_inliers: usize,
    /// Minimal share of the correspondences that must agree with the model.
    pub min_inlier_ratio: f32,
    /// Seed of the sampler; runs are deterministic for a fixed seed.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            reproj_threshold: 3.0,
            max_iters: 2000,
            confidence: 0.995,
            min_inliers: 8,
            min_inlier_ratio: 0.25,
            seed: 0x6a69_6773_6177,
        }
    }
}

impl RansacParams {
    /// Consensus size needed out of `n` correspondences.
    pub fn required_inliers(&self, n: usize) -> usize {
        let by_ratio = (self.min_inlier_ratio.clamp(0.0, 1.0) * n as f32).ceil() as usize;
        self.min_inliers.max(by_ratio).max(4)
    }
}

/// Consensus homography plus the inlier mask over the input correspondences.
#[derive(Clone, Debug)]
pub struct RansacHomography {
    pub homography: Homography,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
}

/// Robustly estimate `dst ~ H * src`.
///
/// Hypotheses come from random 4-point samples; the best consensus set is
/// refit with least-squares DLT. The consensus must reach
/// [`RansacParams::required_inliers`], otherwise a minimal sample of four
/// random correspondences would always pass.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, dst, params), fields(n = src.len()))
)]
pub fn estimate_homography_ransac(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    params: &RansacParams,
) -> Result<RansacHomography, RansacError> {
    let n = src.len().min(dst.len());
    if src.len() != dst.len() || n < 4 {
        return Err(RansacError::TooFewCorrespondences(n));
    }

    let thr_sq = params.reproj_threshold * params.reproj_threshold;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut best: Option<(Homography, usize)> = None;
    let mut needed = params.max_iters;
    let mut iter = 0;

    while iter < needed.min(params.max_iters) {
        iter += 1;

        let idx = sample(&mut rng, n, 4).into_vec();
        let s = [src[idx[0]], src[idx[1]], src[idx[2]], src[idx[3]]];
        let d = [dst[idx[0]], dst[idx[1]], dst[idx[2]], dst[idx[3]]];
        let Some(h) = homography_from_4pt(&s, &d) else {
            continue;
        };

        let count = count_inliers(&h, src, dst, thr_sq);
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((h, count));
            needed = adaptive_iterations(count, n, params.confidence);
            if count == n {
                break;
            }
        }
    }

    let (h_sample, count) = best.ok_or(RansacError::NoModel)?;
    let needed = params.required_inliers(n);
    if count < needed {
        debug!("ransac: best consensus {count} < {needed}");
        return Err(RansacError::WeakConsensus {
            inliers: count,
            needed,
        });
    }

    // Refit on the consensus set; keep the sample model if the refit is worse.
    let mask = inlier_mask(&h_sample, src, dst, thr_sq);
    let (in_src, in_dst): (Vec<_>, Vec<_>) = mask
        .iter()
        .zip(src.iter().zip(dst))
        .filter(|(ok, _)| **ok)
        .map(|(_, (s, d))| (*s, *d))
        .unzip();

    let homography = match estimate_homography(&in_src, &in_dst) {
        Some(refit) if count_inliers(&refit, src, dst, thr_sq) >= count => refit,
        _ => h_sample,
    };
    let inliers = inlier_mask(&homography, src, dst, thr_sq);
    let num_inliers = inliers.iter().filter(|&&b| b).count();
    debug!("ransac: {num_inliers}/{n} inliers after {iter} iterations");

    Ok(RansacHomography {
        homography,
        inliers,
        num_inliers,
    })
}

fn count_inliers(h: &Homography, src: &[Point2<f32>], dst: &[Point2<f32>], thr_sq: f32) -> usize {
    src.iter()
        .zip(dst)
        .filter(|(s, d)| h.transfer_error_sq(**s, **d) <= thr_sq)
        .count()
}

fn inlier_mask(h: &Homography, src: &[Point2<f32>], dst: &[Point2<f32>], thr_sq: f32) -> Vec<bool> {
    src.iter()
        .zip(dst)
        .map(|(s, d)| h.transfer_error_sq(*s, *d) <= thr_sq)
        .collect()
}

/// Iterations needed to draw one clean 4-sample with probability `confidence`.
fn adaptive_iterations(inliers: usize, total: usize, confidence: f64) -> usize {
    let w = inliers as f64 / total as f64;
    let p_clean = w.powi(4);
    if p_clean >= 1.0 - 1e-12 {
        return 1;
    }
    if p_clean <= 1e-12 {
        return usize::MAX;
    }
    let k = (1.0 - confidence.clamp(0.0, 1.0 - 1e-12)).ln() / (1.0 - p_clean).ln();
    k.ceil().max(1.0) as usize
}
