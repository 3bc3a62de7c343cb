//! Line-oriented command dispatch shared by the `zugzwang` binary and its
//! tests. Generic over `BufRead`/`Write` so the loop can be driven against an
//! in-memory buffer instead of real stdio.
use crate::board::{Board, Color, Piece};
use crate::moves::execute::{generate_legal, make_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::search::search;
use crate::status::{GameStatus, position_status};
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::Duration;

/// Runs the dispatch loop to completion (EOF or `quit`).
///
/// Returns `Ok(())` on a clean exit, `Err(message)` when a `position`
/// command carries a malformed FEN or an illegal/malformed move — the
/// caller decides what to do with that (the CLI binary turns it into a
/// nonzero exit code).
pub fn run_command_loop<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    tables: &MagicTables,
) -> Result<(), String> {
    let mut board = Board::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };

        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts[0];

        match command {
            "uci" => handle_uci(writer),
            "isready" => {
                let _ = writeln!(writer, "readyok");
            }
            "ucinewgame" => {
                board = Board::new();
            }
            "position" => match handle_position(&parts, tables) {
                Ok(new_board) => board = new_board,
                Err(msg) => return Err(msg),
            },
            "go" => {
                if parts.get(1) == Some(&"perft") {
                    let depth: u32 = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(1);
                    let total =
                        crate::moves::perft::perft_divide(&mut board, tables, depth);
                    let _ = total;
                } else {
                    handle_go(&parts, &mut board, tables, writer);
                }
            }
            "d" | "display" => {
                print_board(&board, writer);
            }
            "quit" => break,
            _ => {}
        }
    }

    Ok(())
}

fn handle_uci<W: Write>(writer: &mut W) {
    let _ = writeln!(writer, "id name Zugzwang");
    let _ = writeln!(writer, "id author the zugzwang contributors");
    let _ = writeln!(writer, "uciok");
}

fn print_board<W: Write>(board: &Board, writer: &mut W) {
    for rank_from_top in 0..8 {
        let rank = 7 - rank_from_top;
        let _ = write!(writer, "{}  ", rank + 1);
        for file in 0..8 {
            let sq = crate::square::Square::from_index((rank * 8 + file) as u8);
            let glyph = match board.piece_at(sq) {
                Some((Color::White, Piece::Pawn)) => 'P',
                Some((Color::White, Piece::Knight)) => 'N',
                Some((Color::White, Piece::Bishop)) => 'B',
                Some((Color::White, Piece::Rook)) => 'R',
                Some((Color::White, Piece::Queen)) => 'Q',
                Some((Color::White, Piece::King)) => 'K',
                Some((Color::Black, Piece::Pawn)) => 'p',
                Some((Color::Black, Piece::Knight)) => 'n',
                Some((Color::Black, Piece::Bishop)) => 'b',
                Some((Color::Black, Piece::Rook)) => 'r',
                Some((Color::Black, Piece::Queen)) => 'q',
                Some((Color::Black, Piece::King)) => 'k',
                None => '.',
            };
            let _ = write!(writer, "{glyph} ");
        }
        let _ = writeln!(writer);
    }
    let _ = writeln!(writer, "   a b c d e f g h");
    let _ = writeln!(writer, "FEN: {}", board.to_fen());
}

fn handle_position(parts: &[&str], tables: &MagicTables) -> Result<Board, String> {
    let mut board = if parts.len() > 1 && parts[1] == "startpos" {
        Board::new()
    } else if parts.len() > 1 && parts[1] == "fen" {
        let fen_start = 2;
        let mut fen_end = parts.len();
        for (i, &part) in parts.iter().enumerate().skip(fen_start) {
            if part == "moves" {
                fen_end = i;
                break;
            }
        }

        let fen_string = parts[fen_start..fen_end].join(" ");
        Board::from_str(&fen_string).map_err(|e| format!("malformed FEN `{fen_string}`: {e}"))?
    } else {
        Board::new()
    };

    if let Some(moves_idx) = parts.iter().position(|&p| p == "moves") {
        for move_str in &parts[moves_idx + 1..] {
            match parse_uci_move(&board, move_str, tables) {
                Some(mv) => make_move_basic(&mut board, mv),
                None => return Err(format!("illegal or malformed move `{move_str}`")),
            }
        }
    }

    Ok(board)
}

fn parse_uci_move(board: &Board, move_str: &str, tables: &MagicTables) -> Option<Move> {
    if move_str.len() < 4 {
        return None;
    }

    let chars: Vec<char> = move_str.chars().collect();

    let from_file = (chars[0] as u8).wrapping_sub(b'a');
    let from_rank = (chars[1] as u8).wrapping_sub(b'1');
    let to_file = (chars[2] as u8).wrapping_sub(b'a');
    let to_rank = (chars[3] as u8).wrapping_sub(b'1');

    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    let from_square = (from_rank * 8 + from_file) as usize;
    let to_square = (to_rank * 8 + to_file) as usize;

    let promo_piece = if move_str.len() >= 5 {
        match chars[4] {
            'q' => Some(Piece::Queen),
            'r' => Some(Piece::Rook),
            'b' => Some(Piece::Bishop),
            'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    let mut board_copy = board.clone();
    generate_legal(&mut board_copy, tables, &mut moves, &mut scratch);

    for mv in moves {
        if (mv.from.index() as usize) == from_square && (mv.to.index() as usize) == to_square {
            if promo_piece.is_some() {
                if mv.promotion == promo_piece {
                    return Some(mv);
                }
            } else if mv.promotion.is_none() {
                return Some(mv);
            }
        }
    }
    None
}

fn handle_go<W: Write>(parts: &[&str], board: &mut Board, tables: &MagicTables, writer: &mut W) {
    match position_status(board, tables) {
        GameStatus::InPlay => {}
        status => {
            let _ = writeln!(writer, "info string position is already over: {status:?}");
            let _ = writeln!(writer, "bestmove 0000");
            return;
        }
    }

    let mut depth = 64;
    let mut time_limit = None;

    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut movetime: Option<u64> = None;

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if i + 1 < parts.len() {
                    depth = parts[i + 1].parse().unwrap_or(64);
                }
                i += 2;
            }
            "movetime" => {
                if i + 1 < parts.len() {
                    movetime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "wtime" => {
                if i + 1 < parts.len() {
                    wtime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "btime" => {
                if i + 1 < parts.len() {
                    btime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "winc" | "binc" | "movestogo" => {
                i += 2;
            }
            "infinite" => {
                depth = 100;
                time_limit = None;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if let Some(ms) = movetime {
        time_limit = Some(Duration::from_millis(ms));
    } else {
        let my_time = if board.side_to_move == Color::White {
            wtime
        } else {
            btime
        };
        if let Some(t) = my_time {
            time_limit = Some(Duration::from_millis(t / 30));
        }
    }

    let (_score, best_move) = search(board, tables, depth, time_limit);

    if let Some(m) = best_move {
        let _ = writeln!(writer, "bestmove {}", m.to_uci());
    } else {
        let _ = writeln!(writer, "bestmove 0000");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;
    use std::io::Cursor;

    fn run(input: &str) -> String {
        let tables = load_magic_tables();
        let mut out = Vec::new();
        run_command_loop(Cursor::new(input.as_bytes()), &mut out, &tables).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn uci_handshake_reports_identity_and_ack() {
        let out = run("uci\nisready\nquit\n");
        assert!(out.contains("id name Zugzwang"));
        assert!(out.contains("uciok"));
        assert!(out.contains("readyok"));
    }

    #[test]
    fn position_and_go_emit_a_bestmove() {
        let out = run("position startpos\ngo depth 2\nquit\n");
        assert!(out.contains("bestmove"));
    }

    #[test]
    fn display_after_moves_reflects_the_played_move() {
        let out = run("position startpos moves e2e4\nd\nquit\n");
        assert!(out.contains("FEN: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"));
    }

    #[test]
    fn malformed_fen_surfaces_as_an_error_without_panicking() {
        let tables = load_magic_tables();
        let mut out = Vec::new();
        let result = run_command_loop(
            Cursor::new(b"position fen not-a-real-fen\nquit\n".as_slice()),
            &mut out,
            &tables,
        );
        assert!(result.is_err());
    }

    #[test]
    fn go_on_a_checkmated_position_skips_search() {
        // Back-rank mate already delivered: black to move, no legal reply.
        // `go` should report the game as over instead of invoking search.
        let out = run("position fen 4R1k1/5ppp/8/8/8/8/8/6K1 b - - 0 1\ngo depth 3\nquit\n");
        assert!(out.contains("position is already over"));
        assert!(out.contains("bestmove 0000"));
    }
}
