//! Template-in-scene localization.

use image::{DynamicImage, GrayImage, RgbImage};
use jigsaw_core::{estimate_homography_ransac, Homography, RansacError};
use log::{debug, info};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::draw::draw_outline;
use crate::error::LocateError;
use crate::features::{extractor_for, FeatureExtractor, Keypoint};
use crate::matching::{select_good_matches, BruteForceMatcher, DescriptorMatcher, FeatureMatch, MatchThreshold};
use crate::params::LocatorParams;

/// Correspondences the homography needs at the very least.
pub const MIN_GOOD_MATCHES: usize = 4;

/// A successful localization with everything needed to visualize it.
#[derive(Clone, Debug)]
pub struct Localization {
    pub template_keypoints: Vec<Keypoint>,
    pub scene_keypoints: Vec<Keypoint>,
    /// Nearest scene match of every template descriptor.
    pub matches: Vec<FeatureMatch>,
    pub threshold: f32,
    pub good_matches: Vec<FeatureMatch>,
    /// RANSAC verdict per good match.
    pub inliers: Vec<bool>,
    /// Template to scene.
    pub homography: Homography,
    /// Template corners `(0,0), (w,0), (w,h), (0,h)` in scene coordinates.
    pub corners: [Point2<f32>; 4],
    /// Scene with the outline drawn on it.
    pub annotated: RgbImage,
}

impl Localization {
    #[inline]
    pub fn num_inliers(&self) -> usize {
        self.inliers.iter().filter(|&&b| b).count()
    }
}

/// Finds a template (one piece, close up) in a scene (the finished
/// puzzle). Strategies are fixed at construction.
pub struct Locator {
    params: LocatorParams,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn DescriptorMatcher>,
    threshold: Box<dyn MatchThreshold>,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(LocatorParams::default())
    }
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator").field("params", &self.params).finish()
    }
}

impl Locator {
    pub fn new(params: LocatorParams) -> Self {
        Self {
            extractor: extractor_for(&params),
            matcher: Box::new(BruteForceMatcher::new(params.metric)),
            threshold: params.threshold.build(),
            params,
        }
    }

    /// Swap in a different good-match policy.
    pub fn with_threshold(mut self, threshold: Box<dyn MatchThreshold>) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    /// [`Locator::locate`] for any colour layout; alpha is dropped.
    pub fn locate_images(
        &self,
        template: &DynamicImage,
        scene: &DynamicImage,
    ) -> Result<Localization, LocateError> {
        self.locate(&template.to_rgb8(), &scene.to_rgb8())
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, template, scene),
            fields(template = ?template.dimensions(), scene = ?scene.dimensions())
        )
    )]
    pub fn locate(&self, template: &RgbImage, scene: &RgbImage) -> Result<Localization, LocateError> {
        check_non_empty(template, "template")?;
        check_non_empty(scene, "scene")?;

        let template_gray: GrayImage = image::imageops::grayscale(template);
        let scene_gray: GrayImage = image::imageops::grayscale(scene);

        let (template_keypoints, template_desc) = self.extractor.detect_and_describe(&template_gray);
        if template_keypoints.is_empty() {
            return Err(LocateError::NoKeypoints { which: "template" });
        }
        let (scene_keypoints, scene_desc) = self.extractor.detect_and_describe(&scene_gray);
        if scene_keypoints.is_empty() {
            return Err(LocateError::NoKeypoints { which: "scene" });
        }
        debug!(
            "{} template / {} scene keypoints",
            template_keypoints.len(),
            scene_keypoints.len()
        );

        let matches = self.matcher.match_descriptors(&template_desc, &scene_desc);
        let (good_matches, threshold) = select_good_matches(&matches, self.threshold.as_ref())
            .ok_or(LocateError::InsufficientMatches { good: 0 })?;
        if good_matches.len() < MIN_GOOD_MATCHES {
            return Err(LocateError::InsufficientMatches {
                good: good_matches.len(),
            });
        }

        let src: Vec<Point2<f32>> = good_matches
            .iter()
            .map(|m| position(&template_keypoints[m.query]))
            .collect();
        let dst: Vec<Point2<f32>> = good_matches
            .iter()
            .map(|m| position(&scene_keypoints[m.train]))
            .collect();
        let fit = estimate_homography_ransac(&src, &dst, &self.params.ransac).map_err(|e| {
            debug!("ransac: {e}");
            match e {
                RansacError::TooFewCorrespondences(good) => LocateError::InsufficientMatches { good },
                RansacError::WeakConsensus { inliers, needed } => {
                    LocateError::WeakConsensus { inliers, needed }
                }
                RansacError::NoModel => LocateError::DegenerateHomography,
            }
        })?;

        let (w, h) = template.dimensions();
        let corners = project_corners(&fit.homography, w as f32, h as f32)
            .ok_or(LocateError::DegenerateHomography)?;
        info!(
            "located template: {} matches, {} good (threshold {threshold}), {} inliers",
            matches.len(),
            good_matches.len(),
            fit.num_inliers
        );

        let mut annotated = scene.clone();
        draw_outline(&mut annotated, &corners, &self.params.outline);

        Ok(Localization {
            template_keypoints,
            scene_keypoints,
            matches,
            threshold,
            good_matches,
            inliers: fit.inliers,
            homography: fit.homography,
            corners,
            annotated,
        })
    }
}

fn check_non_empty(img: &RgbImage, which: &'static str) -> Result<(), LocateError> {
    if img.width() == 0 || img.height() == 0 {
        Err(LocateError::EmptyImage { which })
    } else {
        Ok(())
    }
}

#[inline]
fn position(kp: &Keypoint) -> Point2<f32> {
    Point2::new(kp.x, kp.y)
}

/// Template rectangle mapped into the scene. `None` when a corner goes to
/// infinity or the quad is not a simple convex polygon.
pub fn project_corners(h: &Homography, width: f32, height: f32) -> Option<[Point2<f32>; 4]> {
    let src = [
        Point2::new(0.0, 0.0),
        Point2::new(width, 0.0),
        Point2::new(width, height),
        Point2::new(0.0, height),
    ];
    let mut out = [Point2::origin(); 4];
    for (o, s) in out.iter_mut().zip(src) {
        let p = h.try_apply(s)?;
        if !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        *o = p;
    }
    is_convex(&out).then_some(out)
}

fn is_convex(q: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = q[i];
        let b = q[(i + 1) % 4];
        let c = q[(i + 2) % 4];
        let cross = (b - a).perp(&(c - b));
        if cross.abs() < 1e-6 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn identity_projects_the_rectangle() {
        let corners = project_corners(&Homography::identity(), 40.0, 30.0).expect("corners");
        assert_eq!(corners[2], Point2::new(40.0, 30.0));
    }

    #[test]
    fn folded_quad_is_degenerate() {
        // Every corner lands on the line y = 5.
        let collapse = Homography::new(Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 1.0));
        assert!(project_corners(&collapse, 40.0, 30.0).is_none());
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let locator = Locator::default();
        let err = locator
            .locate(&RgbImage::new(0, 0), &RgbImage::new(10, 10))
            .unwrap_err();
        assert_eq!(err, LocateError::EmptyImage { which: "template" });
    }

    #[test]
    fn flat_template_has_no_keypoints() {
        let locator = Locator::default();
        let flat = RgbImage::from_pixel(80, 80, image::Rgb([90, 90, 90]));
        let err = locator.locate(&flat, &flat).unwrap_err();
        assert_eq!(err, LocateError::NoKeypoints { which: "template" });
    }
}
