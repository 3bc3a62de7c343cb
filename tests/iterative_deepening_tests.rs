use std::str::FromStr;
use zugzwang::board::Board;
use zugzwang::moves::magic::loader::load_magic_tables;
use zugzwang::search::search::search;

#[test]
fn returns_a_move_at_shallow_depth() {
    let mut board =
        Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let tables = load_magic_tables();

    let (score, best_move) = search(&mut board, &tables, 3, None);

    assert!(best_move.is_some(), "iterative deepening should return a move");
    assert!(
        score.abs() < 500,
        "starting position should have a reasonable score, got {score}"
    );
}

#[test]
fn works_across_a_range_of_depths() {
    let mut board =
        Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let tables = load_magic_tables();

    for depth in 1..=5 {
        let (score, best_move) = search(&mut board, &tables, depth, None);
        assert!(best_move.is_some(), "should find move at depth {depth}");
        assert!(
            score.abs() < 1000,
            "score at depth {depth} should be reasonable, got {score}"
        );
    }
}

#[test]
fn finds_a_free_queen_capture() {
    let mut board =
        Board::from_str("rnb1kbnr/pppppppp/8/8/8/3q4/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let tables = load_magic_tables();

    let (score, best_move) = search(&mut board, &tables, 3, None);

    assert!(best_move.is_some());
    assert!(score > 700, "should recognize free queen capture, got {score}");
}

#[test]
fn finds_mate_in_one() {
    let mut board = Board::from_str("6k1/5ppp/8/8/8/8/5PPP/3Q2K1 w - - 0 1").unwrap();
    let tables = load_magic_tables();

    let (score, best_move) = search(&mut board, &tables, 2, None);

    assert!(best_move.is_some(), "should find the mating move");
    assert!(score >= zugzwang::search::tt::MATE_THRESHOLD);
}

#[test]
fn is_deterministic_across_repeated_runs() {
    let mut board1 =
        Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let mut board2 = board1.clone();
    let tables = load_magic_tables();

    let (score1, move1) = search(&mut board1, &tables, 4, None);
    let (score2, move2) = search(&mut board2, &tables, 4, None);

    assert_eq!(score1, score2, "same position should yield same score");
    assert_eq!(move1, move2, "same position should yield same move");
}

#[test]
fn handles_king_and_king_endgame() {
    let mut board = Board::from_str("8/8/8/8/8/3k4/8/3K4 w - - 0 1").unwrap();
    let tables = load_magic_tables();

    let (score, best_move) = search(&mut board, &tables, 4, None);

    assert!(best_move.is_some(), "should find a move even with limited options");
    assert!(score.abs() < 200, "king vs king should be roughly equal, got {score}");
}

#[test]
fn handles_a_complex_middlegame_without_panicking() {
    let mut board =
        Board::from_str("r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 0 1")
            .unwrap();
    let tables = load_magic_tables();

    let (score, best_move) = search(&mut board, &tables, 4, None);

    assert!(best_move.is_some());
    assert!(score.abs() < 500);
}

#[test]
fn score_does_not_wildly_diverge_between_depths() {
    let mut board =
        Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
    let tables = load_magic_tables();

    let (score_d2, _) = search(&mut board, &tables, 2, None);
    let (score_d4, _) = search(&mut board, &tables, 4, None);

    assert!(
        (score_d2 - score_d4).abs() < 200,
        "scores shouldn't vary wildly between depths: d2={score_d2}, d4={score_d4}"
    );
}
