//! Pawn move generation: pushes, captures, promotions, en passant.

use super::super::attack_tables::{bishop_attacks, pawn_attacks, rook_attacks};
use super::super::masks::MoveMasks;
use super::super::types::{Bitboard, Color, Move, MoveFlag, MoveList, Piece, Square};
use super::super::Board;
use super::GenMode;

impl Board {
    pub(super) fn generate_pawn_moves(
        &self,
        us: Color,
        masks: &MoveMasks,
        mode: GenMode,
        moves: &mut MoveList,
    ) {
        let them = !us;
        let enemy = self.occupied[them.index()];
        let empty = !self.all_occupied;
        let (start_rank, promo_rank) = match us {
            Color::White => (Bitboard::RANK_2, 7),
            Color::Black => (Bitboard::RANK_7, 0),
        };

        for from in self.pieces(us, Piece::Pawn).iter() {
            let pin_mask = if masks.pinned().contains(from) {
                self.pin_ray(us, from)
            } else {
                Bitboard::ALL
            };
            let allowed = masks.checkmask & pin_mask;
            let forward = us.forward();

            // Single and double pushes.
            if mode != GenMode::Captures || near_promotion(from, us) {
                let push_sq = Square::from_index((from.index() as i8 + forward) as usize);
                if empty.contains(push_sq) {
                    if allowed.contains(push_sq) {
                        if push_sq.rank() == promo_rank {
                            // Promotions are noisy regardless of how
                            // the pawn reaches the back rank.
                            if mode != GenMode::Quiets {
                                push_promotions(moves, from, push_sq, false);
                            }
                        } else if mode != GenMode::Captures {
                            moves.push(Move::new(from, push_sq, MoveFlag::Quiet));
                        }
                    }
                    if mode != GenMode::Captures && start_rank.contains(from) {
                        let double_sq =
                            Square::from_index((from.index() as i8 + 2 * forward) as usize);
                        if empty.contains(double_sq) && allowed.contains(double_sq) {
                            moves.push(Move::new(from, double_sq, MoveFlag::DoublePawnPush));
                        }
                    }
                }
            }

            if mode == GenMode::Quiets {
                continue;
            }

            // Captures.
            for to in (pawn_attacks(us, from) & enemy & allowed).iter() {
                if to.rank() == promo_rank {
                    push_promotions(moves, from, to, true);
                } else {
                    moves.push(Move::new(from, to, MoveFlag::Capture));
                }
            }

            // En passant. The capture can resolve a check either by
            // landing on the checkmask or by removing the checking
            // pawn, and needs a discovered-check test because two
            // pawns leave the rank at once.
            if let Some(ep) = self.en_passant_target {
                if pawn_attacks(us, from).contains(ep) && pin_mask.contains(ep) {
                    let cap_sq = Square::from_index((ep.index() as i8 - forward) as usize);
                    let resolves_check =
                        masks.checkmask.contains(ep) || masks.checkmask.contains(cap_sq);
                    if resolves_check && !self.en_passant_discovers_check(us, from, ep, cap_sq) {
                        moves.push(Move::new(from, ep, MoveFlag::EnPassant));
                    }
                }
            }
        }
    }

    /// Slider check against our king once both the capturing and the
    /// captured pawn have left their squares.
    fn en_passant_discovers_check(&self, us: Color, from: Square, to: Square, cap_sq: Square) -> bool {
        let king = self.king_square(us);
        let them = (!us).index();
        let occupied = (self.all_occupied
            ^ Bitboard::from_square(from)
            ^ Bitboard::from_square(cap_sq))
            | Bitboard::from_square(to);
        let queens = self.pieces[them][Piece::Queen.index()];
        let rooks = self.pieces[them][Piece::Rook.index()] | queens;
        let bishops = self.pieces[them][Piece::Bishop.index()] | queens;
        (rook_attacks(king, occupied) & rooks).any()
            || (bishop_attacks(king, occupied) & bishops).any()
    }
}

#[inline]
fn near_promotion(from: Square, us: Color) -> bool {
    match us {
        Color::White => from.rank() == 6,
        Color::Black => from.rank() == 1,
    }
}

fn push_promotions(moves: &mut MoveList, from: Square, to: Square, capture: bool) {
    for piece in [Piece::Queen, Piece::Knight, Piece::Rook, Piece::Bishop] {
        moves.push(Move::new(from, to, MoveFlag::promotion_flag(piece, capture)));
    }
}
