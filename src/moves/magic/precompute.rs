//! Builds a full set of magic bitboard tables from scratch: blocker masks,
//! the carry-rippler enumeration of every blocker subset, a random-search
//! magic number per square, and the resulting flat attack tables.

use crate::moves::magic::attacks::{
    bishop_attacks_per_square, get_bishop_attack_bitboards, get_rook_attack_bitboards,
    rook_attacks_per_square,
};
use crate::moves::magic::search::find_magic_number_for_square;
use crate::moves::magic::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// How the per-square magic numbers are seeded.
pub enum MagicTableSeed {
    /// Reproducible search from a caller-supplied seed.
    Fixed(u64),
}

/// Blocker mask for a rook standing on `square`: every square it could be
/// blocked on, excluding the edge of the board (a blocker on the edge can't
/// itself be blocked further, so it never changes which squares are hit).
fn rook_blocker_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in (1..rank).rev() {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in (1..file).rev() {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

fn bishop_blocker_mask(square: usize) -> u64 {
    let rank = square as isize / 8;
    let file = square as isize % 8;
    let mut mask = 0u64;

    let mut r = rank + 1;
    let mut f = file + 1;
    while r < 7 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    r = rank + 1;
    f = file - 1;
    while r < 7 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    r = rank - 1;
    f = file + 1;
    while r > 0 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }
    r = rank - 1;
    f = file - 1;
    while r > 0 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    mask
}

/// Enumerates every subset of `mask`'s set bits via the carry-rippler trick:
/// `subset = (subset - mask) & mask` visits all 2^popcount(mask) subsets and
/// returns to zero, so the loop below runs exactly once per subset.
fn blocker_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1usize << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_rook_entry(square: usize, rng: &mut StdRng) -> Result<MagicEntry, String> {
    let mask = rook_blocker_mask(square);
    let shift = 64 - mask.count_ones();
    let blockers = blocker_subsets(mask);
    let attacks = get_rook_attack_bitboards(square, &blockers);

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let table_len = 1usize << mask.count_ones();
    let mut table = vec![0u64; table_len];
    for (&b, &a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = a;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

fn build_bishop_entry(square: usize, rng: &mut StdRng) -> Result<MagicEntry, String> {
    let mask = bishop_blocker_mask(square);
    let shift = 64 - mask.count_ones();
    let blockers = blocker_subsets(mask);
    let attacks = get_bishop_attack_bitboards(square, &blockers);

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let table_len = 1usize << mask.count_ones();
    let mut table = vec![0u64; table_len];
    for (&b, &a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = a;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

/// Generates a complete rook + bishop magic table set. Each square's table
/// is cross-checked at build time against the classical ray-cast oracle via
/// the collision-detecting search in `magic::search`, so any table this
/// function returns is already self-consistent.
pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let MagicTableSeed::Fixed(s) = seed;
    let mut rng = StdRng::seed_from_u64(s);
    // Draw the rook set and the bishop set from independent sub-streams so
    // that changing one piece's squares can't perturb the other's magics.
    let mut rook_rng = StdRng::seed_from_u64(rng.next_u64());
    let mut bishop_rng = StdRng::seed_from_u64(rng.next_u64());

    let mut rook_entries = Vec::with_capacity(64);
    for square in 0..64 {
        rook_entries.push(build_rook_entry(square, &mut rook_rng)?);
    }

    let mut bishop_entries = Vec::with_capacity(64);
    for square in 0..64 {
        bishop_entries.push(build_bishop_entry(square, &mut bishop_rng)?);
    }

    let tables = MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    };

    debug_assert_magics_match_oracle(&tables);
    Ok(tables)
}

fn debug_assert_magics_match_oracle(tables: &MagicTables) {
    #[cfg(debug_assertions)]
    {
        for square in 0..64usize {
            let mask = tables.rook.entries[square].mask;
            for blockers in blocker_subsets(mask) {
                let expected = rook_attacks_per_square(square, blockers);
                let actual = tables.rook.get_attacks(square, blockers);
                debug_assert_eq!(expected, actual, "rook magic mismatch at square {square}");
            }
            let mask = tables.bishop.entries[square].mask;
            for blockers in blocker_subsets(mask) {
                let expected = bishop_attacks_per_square(square, blockers);
                let actual = tables.bishop.get_attacks(square, blockers);
                debug_assert_eq!(expected, actual, "bishop magic mismatch at square {square}");
            }
        }
    }
}
