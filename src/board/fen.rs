// src/board/fen.rs
// Standard six-field FEN parsing and emission.

use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

impl Board {
    /// Resets `self` to the position described by `fen`'s six fields:
    /// piece placement, side to move, castling rights, en-passant target,
    /// halfmove clock, fullmove number. The fullmove number is parsed and
    /// stored only so the position round-trips through `to_fen`; nothing in
    /// movegen, search, or perft reads it.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN missing piece placement field")?;
        let side = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::new_empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN piece placement must have 8 ranks, found {}",
                ranks.len()
            ));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                    if file > 8 {
                        return Err(format!("FEN rank overflows 8 files: `{rank_str}`"));
                    }
                } else {
                    if file >= 8 {
                        return Err(format!("FEN rank overflows 8 files: `{rank_str}`"));
                    }
                    let (piece, color) = CHAR_TO_PC[ch as usize]
                        .ok_or_else(|| format!("invalid FEN piece glyph `{ch}`"))?;
                    let sq_index = (rank * 8 + file) as u8;
                    let bb = board.bb(color, piece) | (1u64 << sq_index);
                    board.set_bb(color, piece, bb);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(format!("FEN rank does not cover 8 files: `{rank_str}`"));
            }
        }

        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid FEN side-to-move `{other}`")),
        };

        let mut rights = 0u8;
        if castling != "-" {
            for ch in castling.chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("invalid FEN castling glyph `{other}`")),
                };
            }
        }
        board.castling_rights = rights;

        board.en_passant = if ep == "-" {
            None
        } else {
            Some(Square::from_uci(ep).ok_or_else(|| format!("invalid FEN en-passant square `{ep}`"))?)
        };

        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("invalid FEN halfmove clock `{halfmove}`"))?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("invalid FEN fullmove number `{fullmove}`"))?;

        board.validate()?;
        board.refresh_zobrist();

        *self = board;
        Ok(())
    }

    /// Emits the current position as a standard six-field FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::from_index((rank * 8 + file) as u8);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.castling_rights & CASTLE_WK != 0 {
            castling.push('K');
        }
        if self.castling_rights & CASTLE_WQ != 0 {
            castling.push('Q');
        }
        if self.castling_rights & CASTLE_BK != 0 {
            castling.push('k');
        }
        if self.castling_rights & CASTLE_BQ != 0 {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{placement} {side} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}
