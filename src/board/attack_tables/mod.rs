//! Attack generation for all piece types.
//!
//! Sliding pieces use Hyperbola Quintessence, the `o ^ (o - 2r)` trick.
//! Byteswap reverses the occupancy along files, diagonals and
//! anti-diagonals (one set bit per byte in each mask), so both ray
//! directions come out of two subtractions. Ranks live inside a single
//! byte where byteswap cannot help, so they use a 512-entry first-rank
//! lookup instead. Leapers are plain per-square tables.

#![allow(clippy::needless_range_loop)]

mod tables;

use once_cell::sync::Lazy;

use tables::{KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS};

use super::types::{Bitboard, Color, Square};

const FILE_A: u64 = 0x0101_0101_0101_0101;

/// Diagonal masks (a1-h8 direction), excluding the square itself.
static DIAG_MASKS: Lazy<[u64; 64]> = Lazy::new(|| ray_masks(&[(1, 1), (-1, -1)]));

/// Anti-diagonal masks (h1-a8 direction), excluding the square itself.
static ANTI_MASKS: Lazy<[u64; 64]> = Lazy::new(|| ray_masks(&[(1, -1), (-1, 1)]));

/// File masks, excluding the square itself.
static FILE_MASKS: Lazy<[u64; 64]> = Lazy::new(|| ray_masks(&[(1, 0), (-1, 0)]));

fn ray_masks(dirs: &[(isize, isize)]) -> [u64; 64] {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        let mut mask = 0u64;
        for &(dr, df) in dirs {
            let mut r = (sq / 8) as isize + dr;
            let mut f = (sq % 8) as isize + df;
            while (0..8).contains(&r) && (0..8).contains(&f) {
                mask |= 1u64 << (r * 8 + f);
                r += dr;
                f += df;
            }
        }
        masks[sq] = mask;
    }
    masks
}

/// First-rank attack lookup: `[8 * occupancy_6bit + file]`.
///
/// The occupancy index covers only files b-g; edge files never block
/// anything beyond themselves.
static RANK_ATTACKS: Lazy<[u64; 512]> = Lazy::new(|| {
    let mut attacks = [0u64; 512];
    for occ_6bit in 0..64 {
        for file in 0..8 {
            let mut attack = 0u64;
            for f in (file + 1)..8 {
                attack |= 1u64 << f;
                if (1..=6).contains(&f) && occ_6bit & (1 << (f - 1)) != 0 {
                    break;
                }
            }
            for f in (0..file).rev() {
                attack |= 1u64 << f;
                if (1..=6).contains(&f) && occ_6bit & (1 << (f - 1)) != 0 {
                    break;
                }
            }
            attacks[8 * occ_6bit + file] = attack;
        }
    }
    attacks
});

/// Hyperbola Quintessence along one masked ray pair.
#[inline(always)]
fn hyp_quint(occupied: u64, mask: u64, square: usize) -> u64 {
    let piece_bit = 1u64 << square;
    let forward = occupied & mask;
    let backward = forward.swap_bytes();
    let forward_attacks = forward.wrapping_sub(piece_bit.wrapping_mul(2));
    let backward_attacks = backward
        .wrapping_sub(piece_bit.swap_bytes().wrapping_mul(2))
        .swap_bytes();
    (forward_attacks ^ backward_attacks) & mask
}

#[inline(always)]
fn rank_attacks(occupied: u64, square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let occ_6bit = ((occupied >> (rank * 8 + 1)) & 63) as usize;
    RANK_ATTACKS[8 * occ_6bit + file] << (rank * 8)
}

#[inline]
pub(crate) fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let idx = sq.index();
    Bitboard(hyp_quint(occupied.0, DIAG_MASKS[idx], idx) | hyp_quint(occupied.0, ANTI_MASKS[idx], idx))
}

#[inline]
pub(crate) fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let idx = sq.index();
    Bitboard(hyp_quint(occupied.0, FILE_MASKS[idx], idx) | rank_attacks(occupied.0, idx))
}

#[inline]
pub(crate) fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[inline]
pub(crate) fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[sq.index()])
}

#[inline]
pub(crate) fn king_attacks(sq: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[sq.index()])
}

#[inline]
pub(crate) fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color.index()][sq.index()])
}

/// Squares strictly between two aligned squares, empty when the squares
/// share no rank, file or diagonal.
pub(crate) fn between(a: Square, b: Square) -> Bitboard {
    Bitboard(BETWEEN[a.index()][b.index()])
}

/// Full line (both rays plus endpoints) through two aligned squares,
/// empty when unaligned. Used to pin sliders along their ray.
pub(crate) fn line(a: Square, b: Square) -> Bitboard {
    Bitboard(LINE[a.index()][b.index()])
}

static BETWEEN: Lazy<Box<[[u64; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[0u64; 64]; 64]);
    for a in 0..64 {
        let sq_a = Square::from_index(a);
        for b in 0..64 {
            if a == b {
                continue;
            }
            let sq_b = Square::from_index(b);
            let b_bit = 1u64 << b;
            let bishop = bishop_attacks(sq_a, Bitboard(b_bit)).0;
            let rook = rook_attacks(sq_a, Bitboard(b_bit)).0;
            if bishop & b_bit != 0 {
                table[a][b] = bishop & bishop_attacks(sq_b, Bitboard(1u64 << a)).0;
            } else if rook & b_bit != 0 {
                table[a][b] = rook & rook_attacks(sq_b, Bitboard(1u64 << a)).0;
            }
        }
    }
    table
});

static LINE: Lazy<Box<[[u64; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[0u64; 64]; 64]);
    for a in 0..64 {
        let sq_a = Square::from_index(a);
        for b in 0..64 {
            if a == b {
                continue;
            }
            let sq_b = Square::from_index(b);
            let b_bit = 1u64 << b;
            let a_bit = 1u64 << a;
            if bishop_attacks(sq_a, Bitboard::EMPTY).0 & b_bit != 0 {
                table[a][b] = (bishop_attacks(sq_a, Bitboard::EMPTY).0
                    & bishop_attacks(sq_b, Bitboard::EMPTY).0)
                    | a_bit
                    | b_bit;
            } else if rook_attacks(sq_a, Bitboard::EMPTY).0 & b_bit != 0 {
                table[a][b] = (rook_attacks(sq_a, Bitboard::EMPTY).0
                    & rook_attacks(sq_b, Bitboard::EMPTY).0)
                    | a_bit
                    | b_bit;
            }
        }
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn rook_attacks_empty_board() {
        let attacks = rook_attacks(sq("e4"), Bitboard::EMPTY);
        let expected_rank = 0xFFu64 << 24;
        let expected_file = FILE_A << 4;
        let expected = (expected_rank | expected_file) & !(1u64 << 28);
        assert_eq!(attacks.0, expected);
    }

    #[test]
    fn rook_attacks_stop_at_blockers() {
        let blockers = Bitboard::from_square(sq("e6")) | Bitboard::from_square(sq("c4"));
        let attacks = rook_attacks(sq("e4"), blockers);
        assert!(attacks.contains(sq("e6")));
        assert!(!attacks.contains(sq("e7")));
        assert!(attacks.contains(sq("c4")));
        assert!(!attacks.contains(sq("b4")));
    }

    #[test]
    fn bishop_attacks_empty_board() {
        let attacks = bishop_attacks(sq("e4"), Bitboard::EMPTY);
        assert!(attacks.contains(sq("b1")));
        assert!(attacks.contains(sq("h7")));
        assert!(attacks.contains(sq("h1")));
        assert!(attacks.contains(sq("a8")));
        assert!(!attacks.contains(sq("e4")));
        assert_eq!(attacks.count(), 13);
    }

    #[test]
    fn bishop_attacks_stop_at_blockers() {
        let blockers = Bitboard::from_square(sq("g6"));
        let attacks = bishop_attacks(sq("e4"), blockers);
        assert!(attacks.contains(sq("g6")));
        assert!(!attacks.contains(sq("h7")));
    }

    #[test]
    fn queen_combines_rook_and_bishop() {
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            for occ in [Bitboard::EMPTY, Bitboard(0xFF00_FF00_FF00_FF00)] {
                assert_eq!(
                    queen_attacks(sq, occ),
                    bishop_attacks(sq, occ) | rook_attacks(sq, occ)
                );
            }
        }
    }

    #[test]
    fn knight_attacks_corner_and_center() {
        assert_eq!(knight_attacks(sq("a1")).count(), 2);
        assert_eq!(knight_attacks(sq("e4")).count(), 8);
        assert!(knight_attacks(sq("g1")).contains(sq("f3")));
    }

    #[test]
    fn pawn_attacks_direction_and_edges() {
        assert!(pawn_attacks(Color::White, sq("e4")).contains(sq("d5")));
        assert!(pawn_attacks(Color::White, sq("e4")).contains(sq("f5")));
        assert!(pawn_attacks(Color::Black, sq("e4")).contains(sq("d3")));
        assert_eq!(pawn_attacks(Color::White, sq("a2")).count(), 1);
        assert_eq!(pawn_attacks(Color::White, sq("h8")).count(), 0);
    }

    #[test]
    fn between_aligned_and_unaligned() {
        let bb = between(sq("a1"), sq("a8"));
        assert_eq!(bb.count(), 6);
        assert!(bb.contains(sq("a4")));
        assert!(!bb.contains(sq("a1")));
        assert!(!bb.contains(sq("a8")));

        assert_eq!(between(sq("c1"), sq("h6")), between(sq("h6"), sq("c1")));
        assert!(between(sq("a1"), sq("b3")).is_empty());
        assert!(between(sq("e2"), sq("e3")).is_empty());
    }

    #[test]
    fn line_includes_endpoints_and_full_ray() {
        let bb = line(sq("c3"), sq("e5"));
        assert!(bb.contains(sq("a1")));
        assert!(bb.contains(sq("c3")));
        assert!(bb.contains(sq("h8")));
        assert!(line(sq("a1"), sq("c2")).is_empty());
    }
}
