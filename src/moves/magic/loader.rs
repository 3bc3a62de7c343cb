//! Fast-startup acquisition path for magic bitboard tables.
//!
//! The default build derives the tables from the same deterministic search
//! used by `deterministic_magic`, just from a different fixed seed, rather
//! than shipping a hand-maintained table of previously-found magic numbers:
//! a literal hardcoded table can't be cross-checked without the toolchain
//! this repository is built without, while the search path self-validates
//! every candidate against the classical ray-cast oracle before accepting
//! it. Both paths produce the same table shape; only the magics' seed
//! differs, matching the "provenance differs, shape doesn't" contract.

use crate::moves::magic::precompute::{MagicTableSeed, generate_magic_tables};
use crate::moves::magic::structs::MagicTables;

/// Seed for the default, non-`deterministic_magic` startup path.
const DEFAULT_MAGIC_SEED: u64 = 0x5A17_u64;

/// Seed used when the `deterministic_magic` feature asks for the
/// separately-tuned reproducible search path.
const DETERMINISTIC_MAGIC_SEED: u64 = 0x45;

/// Builds the rook and bishop magic tables used for the engine's lifetime.
/// Called once at startup; the result is immutable thereafter.
pub fn load_magic_tables() -> MagicTables {
    let seed = if cfg!(feature = "deterministic_magic") {
        DETERMINISTIC_MAGIC_SEED
    } else {
        DEFAULT_MAGIC_SEED
    };

    generate_magic_tables(MagicTableSeed::Fixed(seed))
        .expect("magic number search failed to converge for one or more squares")
}
