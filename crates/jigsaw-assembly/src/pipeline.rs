//! End-to-end assembly: segment, model, match, lay out, compose.

use image::{DynamicImage, RgbImage};
use log::{info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::annotate::annotate_piece;
use crate::compose::CanvasComposer;
use crate::edge_model::EdgeModeler;
use crate::error::{AssemblyError, PieceIssue};
use crate::layout::{Layout, LayoutResolver};
use crate::matcher::{BorderMatch, BorderMatcher};
use crate::params::AssemblyParams;
use crate::piece::PieceId;
use crate::puzzle::Puzzle;
use crate::segment::Segmenter;

/// Minimum number of border and corner pieces for a perimeter.
pub const MIN_PERIMETER_PIECES: usize = 4;

/// Everything an assembly run produced. Partial results are normal: the
/// canvas is `None` when nothing could be laid out, and `issues` says why.
#[derive(Clone, Debug, Default)]
pub struct Assembly {
    pub puzzle: Puzzle,
    pub matching: BorderMatch,
    pub layout: Layout,
    pub canvas: Option<RgbImage>,
    pub issues: Vec<PieceIssue>,
}

impl Assembly {
    /// One debug rendering per piece, in id order.
    pub fn annotated_pieces(&self) -> Vec<(PieceId, RgbImage)> {
        self.puzzle
            .pieces()
            .iter()
            .map(|p| (p.id, annotate_piece(p)))
            .collect()
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.canvas.is_some()
    }
}

/// Runs the full assembly pipeline with one set of parameters.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    params: AssemblyParams,
    segmenter: Segmenter,
    modeler: EdgeModeler,
    matcher: BorderMatcher,
    composer: CanvasComposer,
}

impl Assembler {
    pub fn new(params: AssemblyParams) -> Self {
        Self {
            segmenter: Segmenter::new(params.segmenter.clone()),
            modeler: EdgeModeler::new(params.edges.clone()),
            matcher: BorderMatcher::new(params.matcher.clone()),
            composer: CanvasComposer::new(params.compose.clone()),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &AssemblyParams {
        &self.params
    }

    /// Same as [`Assembler::assemble`] for any colour layout; alpha is
    /// dropped.
    pub fn assemble_image(&self, scene: &DynamicImage) -> Result<Assembly, AssemblyError> {
        self.assemble(&scene.to_rgb8())
    }

    /// Assemble the pieces photographed in `scene`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene), fields(w = scene.width(), h = scene.height()))
    )]
    pub fn assemble(&self, scene: &RgbImage) -> Result<Assembly, AssemblyError> {
        let (width, height) = scene.dimensions();
        if width == 0 || height == 0 {
            return Err(AssemblyError::EmptyScene { width, height });
        }

        let mut pieces = self.segmenter.segment(scene);
        let mut issues = Vec::new();
        if pieces.is_empty() {
            warn!("no pieces found in {width}x{height} scene");
            issues.push(PieceIssue::SegmentationEmpty);
            return Ok(Assembly {
                issues,
                ..Assembly::default()
            });
        }

        for piece in &mut pieces {
            if let Err(issue) = self.modeler.model(piece) {
                warn!("{issue}");
                issues.push(issue);
            }
        }

        let mut puzzle = Puzzle::new(pieces);
        let mut assembly = self.solve(&mut puzzle);
        issues.append(&mut assembly.issues);
        assembly.issues = issues;
        assembly.puzzle = puzzle;
        Ok(assembly)
    }

    /// Match, lay out and compose already modeled pieces. Any previous
    /// connections in `puzzle` are dropped first, so this can be re-run
    /// with different parameters. The returned assembly's `puzzle` is left
    /// empty; the results live in `puzzle` itself.
    pub fn solve(&self, puzzle: &mut Puzzle) -> Assembly {
        puzzle.reset_connections();
        let mut out = Assembly::default();

        let perimeter = puzzle.perimeter().count();
        if perimeter < MIN_PERIMETER_PIECES {
            warn!("{perimeter} border/corner pieces, cannot close a perimeter");
            out.issues
                .push(PieceIssue::TooFewPerimeterPieces { found: perimeter });
            return out;
        }

        out.matching = self.matcher.run(puzzle);
        out.issues.extend(
            out.matching
                .excluded
                .iter()
                .map(|&piece| PieceIssue::SplitFlatEdges { piece }),
        );

        out.layout = LayoutResolver::new().resolve(puzzle);
        for &id in &out.layout.unplaced {
            if puzzle
                .piece(id)
                .and_then(|p| p.kind)
                .is_some_and(|k| k.is_perimeter())
            {
                out.issues.push(PieceIssue::Unplaced { piece: id });
            }
        }

        out.canvas = self.composer.compose(puzzle);
        info!(
            "assembled {} of {} pieces, {} connections",
            out.layout.placed.len(),
            puzzle.len(),
            out.matching.pairs.len()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::test_support::stub_piece;
    use image::Rgb;

    #[test]
    fn empty_scene_is_an_error() {
        let err = Assembler::default()
            .assemble(&RgbImage::new(0, 10))
            .unwrap_err();
        assert!(matches!(err, AssemblyError::EmptyScene { width: 0, height: 10 }));
    }

    #[test]
    fn blank_scene_reports_segmentation_empty() {
        let scene = RgbImage::from_pixel(40, 30, Rgb([0, 0, 0]));
        let assembly = Assembler::default().assemble(&scene).expect("assembly");
        assert!(assembly.puzzle.is_empty());
        assert!(!assembly.is_solved());
        assert_eq!(assembly.issues, vec![PieceIssue::SegmentationEmpty]);
    }

    #[test]
    fn too_few_perimeter_pieces_leaves_no_canvas() {
        let mut puzzle = Puzzle::new(vec![
            stub_piece(0, [true, true, false, false]),
            stub_piece(1, [true, false, false, false]),
            stub_piece(2, [false; 4]),
        ]);
        let out = Assembler::default().solve(&mut puzzle);
        assert!(out.canvas.is_none());
        assert_eq!(out.issues, vec![PieceIssue::TooFewPerimeterPieces { found: 2 }]);
        assert!(puzzle.connections().is_empty());
    }

    #[test]
    fn plain_rectangles_are_unclassified() {
        let mut scene = RgbImage::new(120, 60);
        for (x, y, px) in scene.enumerate_pixels_mut() {
            if (10..40).contains(&x) && (10..40).contains(&y) || (60..100).contains(&x) && (15..45).contains(&y) {
                *px = Rgb([200, 180, 90]);
            }
        }
        let assembly = Assembler::default().assemble(&scene).expect("assembly");
        assert_eq!(assembly.puzzle.len(), 2);
        let unclassified = assembly
            .issues
            .iter()
            .filter(|i| matches!(i, PieceIssue::UnclassifiedPiece { flat: 4, .. }))
            .count();
        assert_eq!(unclassified, 2);
        assert!(assembly
            .issues
            .contains(&PieceIssue::TooFewPerimeterPieces { found: 0 }));
        assert!(assembly.canvas.is_none());
    }
}
