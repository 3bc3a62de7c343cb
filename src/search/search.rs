use crate::board::Board;
use crate::moves::execute::{make_move_basic, undo_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::{generate_pseudo_legal, generate_pseudo_legal_captures};
use crate::moves::square_control::{in_check, is_legal_castling};
use crate::moves::types::Move;
use crate::search::eval::static_eval;
use crate::search::ordering::order_moves;
use crate::search::tt::{NodeType, TranspositionTable};
use arrayvec::ArrayVec;
use std::time::{Duration, Instant};

const INF: i32 = 32000;
const MATE_SCORE: i32 = 31000;
const MATE_THRESHOLD: i32 = 30000;
const DRAW_SCORE: i32 = 0;
// 512 is a safety margin: the largest legal chess position emits well under
// 256 moves, and pseudo-legal generation (the superset actually buffered
// here) never approaches that margin either.
const MAX_MOVES: usize = 512;

/// Nodes between time checks; cheap enough to not bottleneck shallow
/// searches, frequent enough that `movetime` overruns stay small.
const TIME_CHECK_INTERVAL: u64 = 2048;

/// Moves scores closer to 0 so "mate in N from here" stays "mate in N"
/// once it's bubbled up through however many plies separate here from root.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

pub struct TimeManager {
    pub start_time: Instant,
    pub allotted: Option<Duration>,
    pub stop_signal: bool,
}

impl TimeManager {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: false,
        }
    }

    #[inline(always)]
    pub fn check_time(&mut self) {
        if self.stop_signal {
            return;
        }
        if let Some(limit) = self.allotted
            && self.start_time.elapsed() >= limit
        {
            self.stop_signal = true;
        }
    }

    #[inline(always)]
    pub fn allocated_time(&self) -> Option<Duration> {
        self.allotted
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Captures-and-promotions-only search run off the back of every leaf, so a
/// side that just stands pat mid-exchange isn't scored as if the position
/// were quiet.
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    *nodes += 1;
    if *nodes % TIME_CHECK_INTERVAL == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return alpha;
    }

    let _ = tt; // reserved for future TT-assisted quiescence probes
    let stand_pat = static_eval(board);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut moves: ArrayVec<Move, MAX_MOVES> = ArrayVec::new();
    generate_pseudo_legal_captures(board, tables, &mut moves);
    order_moves(&mut moves, None, board);

    let mover = board.side_to_move;
    for mv in moves {
        make_move_basic(board, mv);
        if in_check(board, mover, tables) {
            undo_move_basic(board);
            continue;
        }

        let score = -quiescence(board, tables, tt, ply + 1, -beta, -alpha, nodes, time);
        undo_move_basic(board);

        if time.stop_signal {
            return alpha;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

/// Plain negamax alpha-beta: no null-move pruning, reductions, or pruning
/// margins beyond the window itself. The transposition table and MVV-LVA
/// move ordering are the only search-shaping mechanisms.
#[allow(clippy::too_many_arguments)]
pub fn negamax(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> (i32, Option<Move>) {
    *nodes += 1;
    if *nodes % TIME_CHECK_INTERVAL == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return (0, None);
    }

    // A position repeating anywhere above the root is heading for a draw
    // regardless of how the rest of the line scores; cutting here keeps the
    // search from wasting depth exploring a line it would only fold back
    // into a repetition anyway.
    if ply > 0 && board.is_repetition() {
        return (DRAW_SCORE, None);
    }

    let hash = board.zobrist;
    let depth_u8 = depth.max(0) as u8;
    let mut hash_move = None;

    if let Some((tt_move, raw_score, tt_depth, _tt_bound)) = tt.probe(hash, depth_u8, alpha, beta) {
        hash_move = tt_move;
        if ply > 0 && tt_depth as i32 >= depth {
            return (score_from_tt(raw_score, ply as i32), tt_move);
        }
    }

    let in_check_now = in_check(board, board.side_to_move, tables);
    // Extending one ply when in check resolves forced sequences instead of
    // cutting them off at the horizon.
    let extension = if in_check_now { 1 } else { 0 };

    if depth <= 0 && !in_check_now {
        let score = quiescence(board, tables, tt, ply, alpha, beta, nodes, time);
        return (score, None);
    }

    let mut moves: ArrayVec<Move, MAX_MOVES> = ArrayVec::new();
    generate_pseudo_legal(board, tables, &mut moves);
    order_moves(&mut moves, hash_move, board);

    let mover = board.side_to_move;
    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move = None;
    let mut legal_move_count = 0u32;

    for mv in moves {
        if mv.is_castling() && !is_legal_castling(board, mv, tables) {
            continue;
        }

        make_move_basic(board, mv);
        if in_check(board, mover, tables) {
            undo_move_basic(board);
            continue;
        }
        legal_move_count += 1;

        let (child_score, _) = negamax(
            board,
            tables,
            tt,
            depth - 1 + extension,
            ply + 1,
            -beta,
            -alpha,
            nodes,
            time,
        );
        let score = -child_score;
        undo_move_basic(board);

        if time.stop_signal {
            return (0, None);
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
            }
        }
        if alpha >= beta {
            break;
        }
    }

    if legal_move_count == 0 {
        let terminal_score = if in_check_now {
            -MATE_SCORE + ply as i32
        } else {
            0
        };
        return (terminal_score, None);
    }

    if time.stop_signal {
        return (0, None);
    }

    let node_type = if best_score >= beta {
        NodeType::LowerBound
    } else if best_score > original_alpha {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };

    tt.save(
        hash,
        best_move,
        score_to_tt(best_score, ply as i32),
        depth_u8,
        node_type as u8,
    );

    (best_score, best_move)
}

/// Iterative deepening driver. Each completed depth's best move is reported
/// via `info depth ... pv ...`; an incomplete depth (the clock ran out
/// mid-search) never overwrites the previous depth's result.
pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> (i32, Option<Move>) {
    let mut best_score = 0;
    let mut best_move = None;
    let mut nodes = 0u64;
    let mut tt = TranspositionTable::new(64);
    let mut time = TimeManager::new(time_limit);

    for depth in 1..=max_depth {
        let (score, mv) = negamax(board, tables, &mut tt, depth, 0, -INF, INF, &mut nodes, &mut time);

        if time.stop_signal {
            break;
        }

        best_score = score;
        best_move = mv;

        if let Some(valid_mv) = best_move {
            let score_str = if best_score.abs() >= MATE_THRESHOLD {
                let moves_to_mate = (MATE_SCORE - best_score.abs() + 1) / 2;
                if best_score > 0 {
                    format!("mate {moves_to_mate}")
                } else {
                    format!("mate -{moves_to_mate}")
                }
            } else {
                format!("cp {best_score}")
            };

            println!(
                "info depth {depth} score {score_str} nodes {nodes} time {} pv {}",
                time.elapsed().as_millis(),
                valid_mv.to_uci()
            );
        }

        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    (best_score, best_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;

    #[test]
    fn finds_mate_in_one() {
        // White to move, Qh5-f7# not available; use a simple back-rank mate setup.
        let tables = load_magic_tables();
        let mut board: Board = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1".parse().unwrap();
        let (score, mv) = search(&mut board, &tables, 3, None);
        assert!(score >= MATE_THRESHOLD);
        assert!(mv.is_some());
    }

    #[test]
    fn startpos_returns_a_legal_move_at_shallow_depth() {
        let tables = load_magic_tables();
        let mut board = Board::new();
        let (_, mv) = search(&mut board, &tables, 2, None);
        assert!(mv.is_some());
    }
}
