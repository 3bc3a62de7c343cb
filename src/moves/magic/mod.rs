//! Magic-bitboard sliding-piece attack tables: generation, storage and lookup.

pub mod attacks;
pub mod loader;
pub mod precompute;
pub mod search;
pub mod structs;

pub use structs::MagicTables;
