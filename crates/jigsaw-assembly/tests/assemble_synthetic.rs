use jigsaw_assembly::synthetic::{generate, SyntheticParams, SyntheticPuzzle};
use jigsaw_assembly::{Assembler, Assembly, AssemblyParams, PieceKind};
use jigsaw_core::GridCell;
use nalgebra::Point2;

fn assemble(params: &SyntheticParams) -> (SyntheticPuzzle, Assembly) {
    let synthetic = generate(params);
    let assembly = Assembler::new(AssemblyParams::default())
        .assemble(&synthetic.scene)
        .expect("assembly");
    (synthetic, assembly)
}

/// Ground-truth cell of every segmented piece, by nearest body centre.
fn truth_cells(synthetic: &SyntheticPuzzle, assembly: &Assembly) -> Vec<GridCell> {
    assembly
        .puzzle
        .pieces()
        .iter()
        .map(|p| {
            let c = p.centroid().expect("centroid");
            let scene = Point2::new(p.origin[0] as f64 + c.x, p.origin[1] as f64 + c.y);
            synthetic.nearest(scene).expect("truth").cell
        })
        .collect()
}

/// Quarter turn (clockwise on screen) of a grid offset.
fn turn(cell: GridCell, q: u8) -> GridCell {
    (0..q).fold(cell, |c, _| GridCell::new(-c.y, c.x))
}

/// The solved layout equals the true one up to a global quarter turn and a
/// shift.
fn assert_layout_matches_truth(synthetic: &SyntheticPuzzle, assembly: &Assembly) {
    let truth = truth_cells(synthetic, assembly);
    let anchor = assembly.layout.anchor.expect("anchor");
    let t0 = truth[anchor.0];
    let consistent = (0..4).any(|q| {
        assembly.layout.placed.iter().all(|id| {
            let placed = assembly.puzzle.piece(*id).and_then(|p| p.placement).expect("placement");
            let rel = GridCell::new(truth[id.0].x - t0.x, truth[id.0].y - t0.y);
            turn(rel, q) == placed.cell
        })
    });
    assert!(consistent, "layout does not match the ground truth");
}

#[test]
fn two_by_two_is_solved() {
    let (synthetic, assembly) = assemble(&SyntheticParams {
        rows: 2,
        cols: 2,
        ..SyntheticParams::default()
    });
    assert_eq!(assembly.puzzle.len(), 4, "issues: {:?}", assembly.issues);
    assert_eq!(assembly.puzzle.corners().count(), 4);
    assert_eq!(assembly.matching.pairs.len(), 4);
    assert!(assembly.issues.is_empty(), "issues: {:?}", assembly.issues);
    assert_eq!(assembly.layout.placed.len(), 4);
    assert_layout_matches_truth(&synthetic, &assembly);

    let compose = &AssemblyParams::default().compose;
    let side = 2 * compose.cell_pitch + 2 * compose.padding;
    let canvas = assembly.canvas.as_ref().expect("canvas");
    assert_eq!(canvas.dimensions(), (side, side));

    // Upright quarter turns keep the piece area.
    let lit = canvas.pixels().filter(|p| p.0 != compose.background).count() as f64;
    let expected = 4.0 * (synthetic.params.side * synthetic.params.side) as f64;
    assert!((lit - expected).abs() < 0.05 * expected, "lit = {lit}");
}

#[test]
fn three_by_three_ring_is_solved() {
    let (synthetic, assembly) = assemble(&SyntheticParams::default());
    assert_eq!(assembly.puzzle.len(), 9);
    let kinds = |k: PieceKind| {
        assembly
            .puzzle
            .pieces()
            .iter()
            .filter(|p| p.kind == Some(k))
            .count()
    };
    assert_eq!(kinds(PieceKind::Corner), 4);
    assert_eq!(kinds(PieceKind::Border), 4);
    assert_eq!(kinds(PieceKind::Interior), 1);

    // Perimeter only: the interior piece stays unplaced without an issue.
    assert_eq!(assembly.matching.pairs.len(), 8);
    assert_eq!(assembly.layout.placed.len(), 8);
    assert_eq!(assembly.layout.unplaced.len(), 1);
    assert!(assembly.issues.is_empty(), "issues: {:?}", assembly.issues);
    assert_layout_matches_truth(&synthetic, &assembly);

    let compose = &AssemblyParams::default().compose;
    let side = 3 * compose.cell_pitch + 2 * compose.padding;
    assert_eq!(assembly.canvas.as_ref().map(|c| c.dimensions()), Some((side, side)));
}

#[test]
fn turned_pieces_are_put_back() {
    let (synthetic, assembly) = assemble(&SyntheticParams {
        rows: 2,
        cols: 3,
        rotate_pieces: true,
        seed: 11,
        ..SyntheticParams::default()
    });
    assert_eq!(assembly.puzzle.len(), 6);
    assert_eq!(assembly.matching.pairs.len(), 6);
    assert_eq!(assembly.layout.placed.len(), 6);
    assert_layout_matches_truth(&synthetic, &assembly);
    assert!(assembly.is_solved());
}

#[test]
fn rerunning_the_solver_gives_the_same_connections() {
    let (_, mut assembly) = assemble(&SyntheticParams {
        rows: 2,
        cols: 2,
        seed: 3,
        ..SyntheticParams::default()
    });
    let first = assembly.puzzle.connections();
    let again = Assembler::default().solve(&mut assembly.puzzle);
    assert_eq!(assembly.puzzle.connections(), first);
    assert_eq!(again.matching.pairs.len(), 4);
}
