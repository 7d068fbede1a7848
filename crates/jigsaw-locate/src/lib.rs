//! Locate a close-up photo of one jigsaw piece inside a photo of the
//! finished puzzle.
//!
//! The [`Locator`] detects keypoints on both images, describes them with
//! 256-bit binary descriptors, matches template descriptors against the
//! scene by brute force and keeps the matches accepted by a
//! [`MatchThreshold`] policy. A RANSAC homography then maps the template
//! rectangle into the scene, where its outline is drawn.
//!
//! Two feature strategies are available through [`FeatureKind`]:
//! FAST-9 with plain BRIEF, and an ORB-style variant whose BRIEF pattern is
//! steered by an intensity-centroid orientation.
//!
//! ```no_run
//! use jigsaw_locate::{Locator, LocatorParams};
//!
//! let template = image::open("piece.jpg").unwrap();
//! let scene = image::open("box_cover.jpg").unwrap();
//! match Locator::new(LocatorParams::default()).locate_images(&template, &scene) {
//!     Ok(found) => found.annotated.save("found.png").unwrap(),
//!     Err(e) => eprintln!("not found: {e}"),
//! }
//! ```

mod draw;
mod error;
mod locator;
mod matching;
mod params;

pub mod features;

pub use draw::{draw_outline, render_matches};
pub use error::LocateError;
pub use features::{Descriptor, FeatureExtractor, Keypoint};
pub use locator::{project_corners, Localization, Locator, MIN_GOOD_MATCHES};
pub use matching::{
    select_good_matches, BruteForceMatcher, DescriptorMatcher, FeatureMatch, FixedThreshold,
    MatchThreshold,
};
pub use params::{
    AdaptiveThreshold, FeatureKind, LocatorParams, MatchMetric, OutlineStyle, ThresholdPolicy,
};
