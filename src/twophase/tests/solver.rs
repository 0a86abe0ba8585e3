use twophase::{
    CubeError, CubieCube, MalformedCubeError, MoveSequence, Solution, SolveError, Solver,
    UnreachableStateError,
};

const SOLVED: &str = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB";

fn assert_solves(cube: &CubieCube, solution: &Solution) {
    assert!(
        cube.apply_sequence(&solution.moves()).is_solved(),
        "{solution} does not solve {cube}"
    );
}

#[test_log::test]
fn sune_within_twenty() {
    let cube = CubieCube::from_scramble("R U R' U R U2 R'").unwrap();
    let solution = Solver::new().with_max_length(20).solve(&cube).unwrap();
    assert!(solution.len() <= 20);
    assert_solves(&cube, &solution);
}

#[test_log::test]
fn solved_cube() {
    let solution = Solver::new().solve(&CubieCube::solved()).unwrap();
    assert!(solution.is_empty());
    assert_eq!(
        Solver::new().solve_facelets(&CubieCube::solved().to_facelets()),
        Ok(solution)
    );
}

#[test_log::test]
fn random_scrambles() {
    let solver = Solver::new();
    for _ in 0..5 {
        let scramble = MoveSequence::random(25);
        let cube = CubieCube::SOLVED.apply_sequence(scramble.moves());
        let solution = solver.solve(&cube).unwrap();
        assert!(solution.len() <= solver.max_length(), "{scramble}: {solution}");
        assert_solves(&cube, &solution);
    }
}

#[test_log::test]
fn facelet_input() {
    let solver = Solver::new();
    for facelets in [
        SOLVED,
        "UUUUUUUUUBBBRRRRRRRRRFFFFFFDDDDDDDDDFFFLLLLLLLLLBBBBBB",
        "FLLLULFRFRUURRRBBBLDDFFUBRUDFRDDUFLDUFUFLDLBRBDRBBULBD",
        "BUDFUDRFDBRFURBFDRDULRFBUBURDLFDLRDDULFULBBRFLRLLBLBFU",
    ] {
        let cube: CubieCube = facelets.parse().unwrap();
        let solution = solver.solve_facelets(facelets).unwrap();
        assert_solves(&cube, &solution);
    }
}

#[test]
fn malformed_facelets() {
    // Nine of every color but one, ten of another
    let facelets = SOLVED.replacen('R', "U", 1);
    assert!(matches!(
        Solver::new().solve_facelets(&facelets),
        Err(SolveError::Cube(CubeError::Malformed(
            MalformedCubeError::WrongColorCount { .. }
        )))
    ));
}

#[test]
fn corner_with_foreign_sticker() {
    // A D sticker on the URF corner and a U sticker on DFR
    let mut facelets = SOLVED.chars().collect::<Vec<_>>();
    facelets[8] = 'D';
    facelets[29] = 'U';
    let facelets = facelets.into_iter().collect::<String>();
    assert!(matches!(
        Solver::new().solve_facelets(&facelets),
        Err(SolveError::Cube(CubeError::Malformed(
            MalformedCubeError::UnknownCubie { kind: "corner", .. }
        )))
    ));
}

#[test]
fn unreachable_cube() {
    // The UR edge flipped in place
    let mut facelets = SOLVED.chars().collect::<Vec<_>>();
    facelets.swap(5, 10);
    let facelets = facelets.into_iter().collect::<String>();
    assert_eq!(
        Solver::new().solve_facelets(&facelets),
        Err(SolveError::Cube(CubeError::Unreachable(
            UnreachableStateError::EdgeFlip
        )))
    );
}

#[test]
fn bad_scramble() {
    assert!(matches!(
        Solver::new().solve_scramble("R U Q"),
        Err(SolveError::Cube(CubeError::Malformed(
            MalformedCubeError::InvalidMoveToken(_)
        )))
    ));
}
