//! Move ordering: hash move first, then MVV-LVA captures, then everything
//! else in generation order. No SEE classification, killer moves, or
//! history heuristic — those bias the search away from the literal
//! negamax this ordering feeds.

use crate::board::{Board, Piece};
use crate::moves::types::Move;

const HASH_MOVE_SCORE: i32 = 25_000;
const CAPTURE_BASE: i32 = 20_000;

/// `25000` for the transposition table's hash move, `20000 + value(captured)
/// - value(mover)` for captures (most-valuable-victim, least-valuable-
/// attacker), `0` otherwise.
pub fn score_move(mv: Move, hash_move: Option<Move>, board: &Board) -> i32 {
    if hash_move == Some(mv) {
        return HASH_MOVE_SCORE;
    }

    if mv.is_capture() {
        let captured_value = if mv.is_en_passant() {
            Piece::Pawn.value()
        } else {
            board
                .piece_type_at(mv.to)
                .map(Piece::value)
                .unwrap_or(0)
        };
        return CAPTURE_BASE + captured_value - mv.piece.value();
    }

    0
}

/// Orders `moves` highest-score-first via selection sort: each slot picks
/// the best-scoring move remaining among the unsorted suffix. Equivalent in
/// result to a full sort, but matches the one-pick-per-slot shape a search
/// loop that might cut off early (a beta cutoff before the list is
/// exhausted) actually wants.
pub fn order_moves(moves: &mut [Move], hash_move: Option<Move>, board: &Board) {
    let mut scores: Vec<i32> = moves.iter().map(|&mv| score_move(mv, hash_move, board)).collect();

    for i in 0..moves.len() {
        let mut best = i;
        for j in (i + 1)..moves.len() {
            if scores[j] > scores[best] {
                best = j;
            }
        }
        if best != i {
            moves.swap(i, best);
            scores.swap(i, best);
        }
    }
}
