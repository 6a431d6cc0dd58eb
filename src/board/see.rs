//! Static exchange evaluation.
//!
//! Threshold form: `see(mv, threshold)` answers whether the exchange
//! sequence on the destination square nets at least `threshold`
//! centipawns for the moving side, assuming both sides always
//! recapture with their least valuable attacker. Each capture shrinks
//! the occupancy, refreshing slider attacks so x-ray attackers join
//! the exchange.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::types::{Bitboard, Move, Piece, Square};
use super::Board;

/// Piece values for exchange evaluation. The king's value never enters
/// a balance; capturing it is excluded by the recapture rule.
const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20000];

impl Board {
    /// Whether the exchange started by `mv` wins at least `threshold`.
    ///
    /// Promotions are valued as the moving pawn and castling never
    /// loses material; both are the usual move-ordering approximations.
    #[must_use]
    pub fn see(&self, mv: Move, threshold: i32) -> bool {
        if mv.is_castle() {
            return threshold <= 0;
        }
        let from = mv.from();
        let to = mv.to();

        let victim_value = if mv.is_en_passant() {
            SEE_VALUES[Piece::Pawn.index()]
        } else {
            self.piece_type_at(to).map_or(0, |p| SEE_VALUES[p.index()])
        };

        // Best case: keep the victim, lose nothing.
        let mut swap = victim_value - threshold;
        if swap < 0 {
            return false;
        }

        let attacker = match self.piece_type_at(from) {
            Some(piece) => piece,
            None => return false,
        };
        // Worst case: the attacker is immediately lost.
        swap = SEE_VALUES[attacker.index()] - swap;
        if swap <= 0 {
            return true;
        }

        let mut occupied =
            self.all_occupied ^ Bitboard::from_square(from) ^ Bitboard::from_square(to);
        if mv.is_en_passant() {
            let cap_sq = Square::from_index(
                (to.index() as i8 - self.side_to_move().forward()) as usize,
            );
            occupied ^= Bitboard::from_square(cap_sq);
        }

        let mut stm = self.side_to_move();
        let mut attackers = self.all_attackers_to(to, occupied);
        let mut winning = true;

        loop {
            stm = !stm;
            attackers &= occupied;
            let stm_attackers = attackers & self.occupied[stm.index()];
            if stm_attackers.is_empty() {
                break;
            }
            winning = !winning;

            let Some((piece, attacker_bb)) = least_valuable(self, stm_attackers) else {
                break;
            };

            if piece == Piece::King {
                // The king may only recapture when the opponent has no
                // attacker left to take it back.
                if (attackers & self.occupied[(!stm).index()]).any() {
                    winning = !winning;
                }
                break;
            }

            swap = SEE_VALUES[piece.index()] - swap;
            if swap < i32::from(winning) {
                break;
            }

            occupied ^= attacker_bb;
            // Removing a piece may uncover a slider behind it.
            match piece {
                Piece::Pawn | Piece::Bishop => {
                    attackers |= bishop_attacks(to, occupied) & self.diagonal_sliders();
                }
                Piece::Rook => {
                    attackers |= rook_attacks(to, occupied) & self.orthogonal_sliders();
                }
                Piece::Queen => {
                    attackers |= (bishop_attacks(to, occupied) & self.diagonal_sliders())
                        | (rook_attacks(to, occupied) & self.orthogonal_sliders());
                }
                _ => {}
            }
        }
        winning
    }

    /// All attackers of both colors under the given occupancy.
    fn all_attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        use super::attack_tables::{king_attacks, knight_attacks, pawn_attacks};
        use super::types::Color;
        (pawn_attacks(Color::Black, sq) & self.pieces(Color::White, Piece::Pawn))
            | (pawn_attacks(Color::White, sq) & self.pieces(Color::Black, Piece::Pawn))
            | (knight_attacks(sq)
                & (self.pieces(Color::White, Piece::Knight)
                    | self.pieces(Color::Black, Piece::Knight)))
            | (king_attacks(sq)
                & (self.pieces(Color::White, Piece::King) | self.pieces(Color::Black, Piece::King)))
            | (bishop_attacks(sq, occupied) & self.diagonal_sliders())
            | (rook_attacks(sq, occupied) & self.orthogonal_sliders())
    }

    #[inline]
    fn diagonal_sliders(&self) -> Bitboard {
        self.pieces[0][Piece::Bishop.index()]
            | self.pieces[0][Piece::Queen.index()]
            | self.pieces[1][Piece::Bishop.index()]
            | self.pieces[1][Piece::Queen.index()]
    }

    #[inline]
    fn orthogonal_sliders(&self) -> Bitboard {
        self.pieces[0][Piece::Rook.index()]
            | self.pieces[0][Piece::Queen.index()]
            | self.pieces[1][Piece::Rook.index()]
            | self.pieces[1][Piece::Queen.index()]
    }
}

/// Least valuable attacker in a set, as piece type and single-bit board.
fn least_valuable(board: &Board, attackers: Bitboard) -> Option<(Piece, Bitboard)> {
    for piece in Piece::ALL {
        let candidates =
            attackers & (board.pieces[0][piece.index()] | board.pieces[1][piece.index()]);
        if candidates.any() {
            return Some((piece, Bitboard(candidates.0 & candidates.0.wrapping_neg())));
        }
    }
    None
}
