//! Facade over the jigsaw solver workspace.
//!
//! - [`assembly`]: reconstruct a puzzle from a photo of its scattered
//!   pieces.
//! - [`locate`]: find one photographed piece inside a picture of the
//!   finished puzzle.
//! - [`core`]: shared geometry, homographies and logging.
//!
//! The helpers below load images from disk, run one engine with a
//! [`SolverConfig`] and return its result.
//!
//! ```no_run
//! use jigsaw_solver::{assemble_file, SolverConfig};
//!
//! # fn main() -> Result<(), jigsaw_solver::SolveError> {
//! let config = SolverConfig::load_json("solver.json")?;
//! let assembly = assemble_file("pieces.png", &config)?;
//! if let Some(canvas) = &assembly.canvas {
//!     canvas.save("solved.png")?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod io;

use std::fs;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub use jigsaw_assembly as assembly;
pub use jigsaw_core as core;
pub use jigsaw_locate as locate;

pub use error::SolveError;
pub use io::{ConfigError, SolverConfig};

pub use jigsaw_assembly::{Assembler, Assembly, AssemblyParams, PieceIssue};
pub use jigsaw_locate::{Localization, LocateError, Locator, LocatorParams};

/// Load `scene` and assemble the pieces it shows.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(scene, config), fields(scene = %scene.as_ref().display()))
)]
pub fn assemble_file(scene: impl AsRef<Path>, config: &SolverConfig) -> Result<Assembly, SolveError> {
    let img = image::open(scene)?;
    Ok(Assembler::new(config.assembly.clone()).assemble_image(&img)?)
}

/// Load both images and locate `template` inside `scene`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(template, scene, config),
        fields(template = %template.as_ref().display(), scene = %scene.as_ref().display())
    )
)]
pub fn locate_files(
    template: impl AsRef<Path>,
    scene: impl AsRef<Path>,
    config: &SolverConfig,
) -> Result<Localization, SolveError> {
    let template = image::open(template)?;
    let scene = image::open(scene)?;
    Ok(Locator::new(config.locate.clone()).locate_images(&template, &scene)?)
}

/// Save one annotated raster per piece as `piece_<id>.png` in `dir`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(assembly, dir), fields(dir = %dir.as_ref().display()))
)]
pub fn dump_pieces(assembly: &Assembly, dir: impl AsRef<Path>) -> Result<usize, SolveError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let pieces = assembly.annotated_pieces();
    for (id, img) in &pieces {
        img.save(dir.join(format!("piece_{:03}.png", id.0)))?;
    }
    Ok(pieces.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn missing_scene_is_an_image_error() {
        let err = assemble_file("/no/such/scene.png", &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::Image(_)));
    }

    #[test]
    fn flat_template_is_a_locate_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        RgbImage::from_pixel(64, 64, image::Rgb([80, 80, 80]))
            .save(&path)
            .unwrap();
        let err = locate_files(&path, &path, &SolverConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Locate(LocateError::NoKeypoints { which: "template" })
        ));
    }

    #[test]
    fn blank_scene_dumps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("blank.png");
        RgbImage::new(32, 32).save(&scene).unwrap();
        let assembly = assemble_file(&scene, &SolverConfig::default()).unwrap();
        assert!(!assembly.is_solved());
        let out = dir.path().join("pieces");
        assert_eq!(dump_pieces(&assembly, &out).unwrap(), 0);
        assert!(out.is_dir());
    }
}
