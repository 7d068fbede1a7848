//! Jigsaw assembly from a single photo of scattered pieces.
//!
//! The pipeline is a chain of small stages, each usable on its own:
//!
//! 1. [`Segmenter`] finds the outermost foreground blobs and cuts one
//!    [`Piece`] per blob (raster crop, silhouette mask, local contour).
//! 2. [`EdgeModeler`] reduces the contour, picks four corners, splits it
//!    into four [`Edge`]s and classifies the piece by its flat edges.
//! 3. [`BorderMatcher`] pairs the edges next to the straight sides of
//!    border and corner pieces by shape complementarity.
//! 4. [`LayoutResolver`] walks the connections from an anchor and assigns
//!    grid cells and quarter-turn rotations.
//! 5. [`CanvasComposer`] pastes every placed piece upright into its cell.
//!
//! [`Assembler`] runs all of them and collects the per-piece
//! [`PieceIssue`]s. The [`synthetic`] module generates scenes with known
//! solutions.
//!
//! ```no_run
//! use jigsaw_assembly::{Assembler, AssemblyParams};
//!
//! let scene = image::open("pieces.png").unwrap();
//! let assembly = Assembler::new(AssemblyParams::default())
//!     .assemble_image(&scene)
//!     .unwrap();
//! if let Some(canvas) = &assembly.canvas {
//!     canvas.save("solved.png").unwrap();
//! }
//! for issue in &assembly.issues {
//!     eprintln!("{issue}");
//! }
//! ```

mod annotate;
mod compose;
mod edge_model;
mod error;
mod groups;
mod layout;
mod matcher;
mod params;
mod piece;
mod pipeline;
mod puzzle;
mod segment;

pub mod synthetic;

pub use annotate::annotate_piece;
pub use compose::{upright_rotation_degrees, CanvasComposer};
pub use edge_model::{is_flat, normalize_curve, EdgeModeler};
pub use error::{AssemblyError, PieceIssue};
pub use groups::PieceGroups;
pub use layout::{facing, rotation_for, Layout, LayoutResolver};
pub use matcher::{cost_matrix, edge_distance, BorderMatch, BorderMatcher, MatchedPair, INCOMPATIBLE};
pub use params::{
    AssemblyParams, BorderMatchParams, ComposeParams, EdgeModelParams, SegmenterParams,
};
pub use piece::{Edge, EdgeIndex, EdgeRef, Piece, PieceId, PieceKind, Placement};
pub use pipeline::{Assembler, Assembly, MIN_PERIMETER_PIECES};
pub use puzzle::Puzzle;
pub use segment::Segmenter;
