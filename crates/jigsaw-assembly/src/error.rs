use crate::piece::PieceId;

/// Input-level failures of the assembly pipeline.
#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    #[error("scene image is empty ({width}x{height})")]
    EmptyScene { width: u32, height: u32 },
}

/// Non-fatal findings collected while assembling. None of them aborts the
/// run; affected pieces or pairs simply drop out.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum PieceIssue {
    #[error("no usable piece contours in the scene")]
    SegmentationEmpty,
    #[error("piece {piece}: {reason}")]
    DegeneratePiece { piece: PieceId, reason: String },
    #[error("piece {piece}: {flat} flat edges, excluded from matching")]
    UnclassifiedPiece { piece: PieceId, flat: usize },
    #[error("piece {piece}: flat edges are not adjacent, excluded from matching")]
    SplitFlatEdges { piece: PieceId },
    #[error("only {found} border/corner pieces, need at least 4")]
    TooFewPerimeterPieces { found: usize },
    #[error("piece {piece} is not connected to the anchor and stays unplaced")]
    Unplaced { piece: PieceId },
}
