//! Core types and utilities shared by the jigsaw assembly and localization
//! engines.
//!
//! This crate is intentionally small and purely geometric: polygon helpers,
//! integer grid cells with quarter-turn rotations, projective homographies
//! (DLT, 4-point and RANSAC) and a couple of raster sampling helpers on top
//! of `image` buffers.

mod geometry;
mod grid;
mod homography;
mod logger;
mod ransac;
mod raster;

pub use geometry::{
    bounding_box, ensure_counter_clockwise_on_screen, normalize_degrees, polygon_centroid,
    signed_area, BoundingBox,
};
pub use grid::{Direction, GridCell, QuarterTurn};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use ransac::{estimate_homography_ransac, RansacError, RansacHomography, RansacParams};
pub use raster::{crop_rgb, crop_gray, sample_bilinear_rgb};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
