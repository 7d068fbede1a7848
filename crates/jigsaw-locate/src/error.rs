/// Reasons a template could not be located. All of them mean "not found";
/// none is a fault of the caller beyond [`LocateError::EmptyImage`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocateError {
    #[error("{which} image is empty")]
    EmptyImage { which: &'static str },
    #[error("no keypoints in the {which} image")]
    NoKeypoints { which: &'static str },
    #[error("only {good} good matches, need at least 4")]
    InsufficientMatches { good: usize },
    #[error("only {inliers} matches agree on a homography, need {needed}")]
    WeakConsensus { inliers: usize, needed: usize },
    #[error("homography estimation degenerated")]
    DegenerateHomography,
}
