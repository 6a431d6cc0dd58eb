//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position hashes for the
//! transposition table and repetition detection. Keys are generated from a
//! fixed seed so hashes are reproducible across runs.

use once_cell::sync::Lazy;
use rand::prelude::*;

pub(crate) struct ZobristKeys {
    /// `piece_keys[color][piece][square]`
    pub(crate) piece_keys: [[[u64; 64]; 6]; 2],
    pub(crate) side_key: u64,
    /// `castling_keys[color][side]`: side 0 = kingside, 1 = queenside
    pub(crate) castling_keys: [[u64; 2]; 2],
    /// Only the file of the en passant target matters for the hash.
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        let mut castling_keys = [[0u64; 2]; 2];
        let mut en_passant_keys = [0u64; 8];

        for color in &mut piece_keys {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_key = rng.gen();

        for color in &mut castling_keys {
            for key in color.iter_mut() {
                *key = rng.gen();
            }
        }

        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            side_key,
            castling_keys,
            en_passant_keys,
        }
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_across_accesses() {
        let a = ZOBRIST.piece_keys[0][0][0];
        let b = ZOBRIST.piece_keys[0][0][0];
        assert_eq!(a, b);
    }

    #[test]
    fn keys_are_distinct() {
        // A quick sanity check that the generator did not hand out duplicates
        // among a sample of keys.
        let mut seen = std::collections::HashSet::new();
        for color in 0..2 {
            for piece in 0..6 {
                for sq in 0..64 {
                    assert!(seen.insert(ZOBRIST.piece_keys[color][piece][sq]));
                }
            }
        }
        assert!(seen.insert(ZOBRIST.side_key));
    }
}
