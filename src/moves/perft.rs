use crate::board::Board;
use crate::moves::{
    execute::{generate_legal, make_move_basic, undo_move_basic},
    magic::MagicTables,
    square_control::in_check,
    types::Move,
};
use crate::search::tt::TranspositionTable;
use std::str::FromStr;
use tracing::{debug, instrument};

const MAX_LOG_DEPTH: u32 = 3; // only trace details for shallow nodes
const MAX_PERFT_DEPTH: usize = 20; // support perft up to depth 20

pub struct PerftCounters {
    pub nodes: u64,
    pub captures: u64,
    pub ep_captures: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounters {
    pub fn zero() -> Self {
        Self {
            nodes: 0,
            captures: 0,
            ep_captures: 0,
            castles: 0,
            promotions: 0,
            checks: 0,
            checkmates: 0,
        }
    }
    pub fn add(&mut self, o: &PerftCounters) {
        self.nodes += o.nodes;
        self.captures += o.captures;
        self.ep_captures += o.ep_captures;
        self.castles += o.castles;
        self.promotions += o.promotions;
        self.checks += o.checks;
        self.checkmates += o.checkmates;
    }
}

// Helper functions for creating buffer arrays
fn create_move_buffer_array() -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(64))
}

fn create_pseudo_buffer_array() -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(256))
}

#[inline]
fn sq_as_a1_zero(idx: u8) -> String {
    // Assumes 0 = a1, 63 = h8 (file = idx % 8, rank = idx / 8)
    let file = idx % 8;
    let rank = idx / 8;
    let f = (b'a' + file) as char;
    let r = (b'1' + rank) as char;
    format!("{f}{r}")
}

#[inline]
fn sq_as_a8_zero(idx: u8) -> String {
    // Assumes 0 = a8, 63 = h1 (file = idx % 8, rank = 7 - idx / 8)
    let file = idx % 8;
    let rank = 7 - (idx / 8);
    let f = (b'a' + file) as char;
    let r = (b'1' + rank) as char;
    format!("{f}{r}")
}

/// Recursive perft with per-ply buffers, memoized in `tt` by (hash, depth).
fn perft_recursive(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    move_buffers: &mut [Vec<Move>],
    pseudo_buffers: &mut [Vec<Move>],
    tt: &mut TranspositionTable,
) -> u64 {
    if depth == 0 {
        return 1;
    }

    if let Some(cached) = tt.probe_perft(board.zobrist, depth as u8) {
        return cached;
    }

    {
        let moves = &mut move_buffers[ply];
        let pseudo = &mut pseudo_buffers[ply];
        moves.clear();
        generate_legal(board, tables, moves, pseudo);
    }

    let move_count = move_buffers[ply].len();
    let mut node_count = 0;

    for i in 0..move_count {
        let mv = move_buffers[ply][i];
        make_move_basic(board, mv);

        node_count += perft_recursive(
            board,
            tables,
            depth - 1,
            ply + 1,
            move_buffers,
            pseudo_buffers,
            tt,
        );

        undo_move_basic(board);
    }

    tt.save_perft(board.zobrist, depth as u8, node_count);
    node_count
}

#[instrument(skip(board, tables), fields(depth))]
pub fn perft(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    if depth as usize > MAX_PERFT_DEPTH {
        panic!(
            "Depth {} exceeds MAX_PERFT_DEPTH {}",
            depth, MAX_PERFT_DEPTH
        );
    }

    let mut move_buffers = create_move_buffer_array();
    let mut pseudo_buffers = create_pseudo_buffer_array();
    let mut tt = TranspositionTable::new(64);

    perft_recursive(
        board,
        tables,
        depth,
        0,
        &mut move_buffers,
        &mut pseudo_buffers,
        &mut tt,
    )
}

#[instrument(skip(board, tables), fields(depth))]
pub fn perft_divide(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    if depth as usize > MAX_PERFT_DEPTH {
        panic!(
            "Depth {} exceeds MAX_PERFT_DEPTH {}",
            depth, MAX_PERFT_DEPTH
        );
    }

    let mut move_buffers = create_move_buffer_array();
    let mut pseudo_buffers = create_pseudo_buffer_array();
    let mut tt = TranspositionTable::new(64);

    // Generate root moves
    {
        let moves = &mut move_buffers[0];
        let pseudo = &mut pseudo_buffers[0];
        moves.clear();
        generate_legal(board, tables, moves, pseudo);

        if depth <= MAX_LOG_DEPTH {
            debug!(depth, moves = moves.len(), "divide: root legal moves");
        }
    }

    let mut total = 0;
    let move_count = move_buffers[0].len();

    for i in 0..move_count {
        let mv = move_buffers[0][i];

        if depth <= MAX_LOG_DEPTH {
            let from = mv.from.index();
            let to = mv.to.index();

            debug!(
                %mv, depth,
                from_idx = from, to_idx = to,
                from_a1 = %sq_as_a1_zero(from), to_a1 = %sq_as_a1_zero(to),
                from_a8 = %sq_as_a8_zero(from), to_a8 = %sq_as_a8_zero(to),
                "divide: exploring root move (decode check)"
            );
        }

        make_move_basic(board, mv);

        let count = if depth == 1 {
            1
        } else {
            perft_recursive(
                board,
                tables,
                depth - 1,
                1,
                &mut move_buffers,
                &mut pseudo_buffers,
                &mut tt,
            )
        };

        undo_move_basic(board);

        if depth <= MAX_LOG_DEPTH {
            debug!(%mv, nodes = count, "divide: root child total");
        }

        println!("{}: {}", mv, count);
        total += count;
    }

    debug!(depth, total, "divide: total");
    println!("Total: {}", total);
    total
}

// Recursive implementation with per-ply buffers for breakdown (no TT: the
// breakdown counters aren't well-defined across a memoized subtree).
fn perft_count_recursive(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    out: &mut PerftCounters,
    move_buffers: &mut [Vec<Move>],
    pseudo_buffers: &mut [Vec<Move>],
) {
    if depth == 0 {
        out.nodes += 1;

        // Leaf: check/mate status
        let side_in_check = in_check(board, board.side_to_move, tables);
        if side_in_check {
            out.checks += 1;
        }

        {
            let tmp = &mut move_buffers[ply];
            let scratch = &mut pseudo_buffers[ply];
            tmp.clear();
            generate_legal(board, tables, tmp, scratch);
        }

        if move_buffers[ply].is_empty() && side_in_check {
            out.checkmates += 1;
        }
        return;
    }

    // Generate moves
    {
        let moves = &mut move_buffers[ply];
        let pseudo = &mut pseudo_buffers[ply];
        moves.clear();
        generate_legal(board, tables, moves, pseudo);
    }

    let move_count = move_buffers[ply].len();
    for i in 0..move_count {
        let mv = move_buffers[ply][i];

        // --- breakdown tags at this ply (edge-based) ---
        if mv.is_capture() {
            out.captures += 1;
            if mv.is_en_passant() {
                out.ep_captures += 1;
            }
        }
        if mv.is_castling() {
            out.castles += 1;
        }
        if mv.promotion.is_some() {
            out.promotions += 1;
        }

        #[cfg(debug_assertions)]
        let z0 = board.zobrist;

        make_move_basic(board, mv);
        perft_count_recursive(board, tables, depth - 1, ply + 1, out, move_buffers, pseudo_buffers);
        undo_move_basic(board);

        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(board.zobrist, z0, "zobrist changed across make/undo");
            debug_assert_eq!(
                board.compute_zobrist_full(),
                board.zobrist,
                "full recompute mismatch"
            );
        }
    }
}

pub fn perft_count_with_breakdown(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    out: &mut PerftCounters,
) {
    if depth as usize > MAX_PERFT_DEPTH {
        panic!(
            "Depth {} exceeds MAX_PERFT_DEPTH {}",
            depth, MAX_PERFT_DEPTH
        );
    }

    let mut move_buffers = create_move_buffer_array();
    let mut pseudo_buffers = create_pseudo_buffer_array();

    perft_count_recursive(
        board,
        tables,
        depth,
        0,
        out,
        &mut move_buffers,
        &mut pseudo_buffers,
    );
}

/// One line of a `perft.epd` corpus: `<FEN> ;D1 N1 ;D2 N2 ...`. The harness
/// picks the deepest `;D<n> <count>` field, since shallower ones are implied
/// by it and not worth a separate run.
pub struct EpdCase {
    pub fen: String,
    pub depth: u32,
    pub expected_nodes: u64,
}

/// Parses a single EPD perft line. Returns `Err` on a blank FEN field, a
/// `;D<n> <count>` field that doesn't parse, or a line with no depth fields
/// at all — this harness has no recovery path for a malformed corpus line,
/// matching the rest of the crate's malformed-input handling.
pub fn parse_epd_line(line: &str) -> Result<EpdCase, String> {
    let mut fields = line.trim().split(';');
    let fen = fields
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("EPD line is missing a FEN field")?
        .to_string();

    let mut deepest: Option<(u32, u64)> = None;
    for field in fields {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let mut tokens = field.split_whitespace();
        let tag = tokens
            .next()
            .ok_or_else(|| format!("malformed EPD depth field: `{field}`"))?;
        let depth_str = tag
            .strip_prefix('D')
            .ok_or_else(|| format!("expected a `D<n>` tag, found `{tag}`"))?;
        let depth: u32 = depth_str
            .parse()
            .map_err(|_| format!("unparseable depth in `{tag}`"))?;
        let count_str = tokens
            .next()
            .ok_or_else(|| format!("`{tag}` has no node count"))?;
        let expected_nodes: u64 = count_str
            .parse()
            .map_err(|_| format!("unparseable node count `{count_str}`"))?;
        if deepest.is_none_or(|(d, _)| depth > d) {
            deepest = Some((depth, expected_nodes));
        }
    }

    let (depth, expected_nodes) =
        deepest.ok_or("EPD line has no `;D<n> <count>` fields")?;
    Ok(EpdCase {
        fen,
        depth,
        expected_nodes,
    })
}

/// Runs one parsed EPD case against the live perft engine and returns the
/// node count actually produced, for the caller to compare against
/// `case.expected_nodes`.
pub fn run_epd_case(case: &EpdCase, tables: &MagicTables) -> Result<u64, String> {
    let mut board = Board::from_str(&case.fen).map_err(|e| format!("bad FEN `{}`: {e}", case.fen))?;
    Ok(perft(&mut board, tables, case.depth))
}

/// Parses and runs every non-blank, non-comment line of an EPD corpus
/// (such as `perft.epd`), returning `(case, actual_nodes)` pairs in file
/// order. A `#`-prefixed line is a comment and is skipped, matching common
/// EPD tooling convention; any other malformed line aborts the whole run,
/// since the corpus is assumed to be hand-curated and not adversarial input.
pub fn run_epd_corpus(corpus: &str, tables: &MagicTables) -> Result<Vec<(EpdCase, u64)>, String> {
    let mut results = Vec::new();
    for line in corpus.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let case = parse_epd_line(line)?;
        let actual = run_epd_case(&case, tables)?;
        results.push((case, actual));
    }
    Ok(results)
}

pub fn perft_divide_with_breakdown(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
) -> Vec<(Move, PerftCounters)> {
    if depth as usize > MAX_PERFT_DEPTH {
        panic!(
            "Depth {} exceeds MAX_PERFT_DEPTH {}",
            depth, MAX_PERFT_DEPTH
        );
    }

    let mut move_buffers = create_move_buffer_array();
    let mut pseudo_buffers = create_pseudo_buffer_array();

    // Generate root moves
    {
        let moves = &mut move_buffers[0];
        let pseudo = &mut pseudo_buffers[0];
        moves.clear();
        generate_legal(board, tables, moves, pseudo);
    }

    let move_count = move_buffers[0].len();
    let mut out = Vec::with_capacity(move_count);

    for i in 0..move_count {
        let mv = move_buffers[0][i];
        make_move_basic(board, mv);
        let mut pc = PerftCounters::zero();

        if depth > 1 {
            perft_count_recursive(
                board,
                tables,
                depth - 1,
                1,
                &mut pc,
                &mut move_buffers,
                &mut pseudo_buffers,
            );
        } else {
            pc.nodes = 1;
        }

        undo_move_basic(board);
        out.push((mv, pc));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_epd_line_picks_deepest_depth() {
        let case =
            parse_epd_line("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 ;D1 20 ;D3 8902 ;D2 400")
                .expect("well-formed line parses");
        assert_eq!(case.depth, 3);
        assert_eq!(case.expected_nodes, 8902);
        assert_eq!(case.fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn parse_epd_line_rejects_missing_depth_fields() {
        assert!(parse_epd_line("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    }

    #[test]
    fn parse_epd_line_rejects_malformed_depth_tag() {
        assert!(parse_epd_line("4k3/8/8/8/8/8/8/4K3 w - - ;depth1 20").is_err());
    }

    #[test]
    fn parse_epd_line_rejects_missing_count() {
        assert!(parse_epd_line("4k3/8/8/8/8/8/8/4K3 w - - ;D1").is_err());
    }
}
