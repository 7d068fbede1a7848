use jigsaw_assembly::AssemblyError;
use jigsaw_locate::LocateError;

use crate::io::ConfigError;

/// Everything the end-to-end helpers can fail with.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("assembly: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("not found: {0}")]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
