//! Bishop, rook and queen move generation.

use super::super::attack_tables::{bishop_attacks, queen_attacks, rook_attacks};
use super::super::masks::MoveMasks;
use super::super::types::{Bitboard, Color, Move, MoveFlag, MoveList, Piece, Square};
use super::super::Board;
use super::GenMode;

impl Board {
    pub(super) fn generate_slider_moves(
        &self,
        us: Color,
        masks: &MoveMasks,
        mode: GenMode,
        moves: &mut MoveList,
    ) {
        for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
            for from in self.pieces(us, piece).iter() {
                let attacks = match piece {
                    Piece::Bishop => bishop_attacks(from, self.all_occupied),
                    Piece::Rook => rook_attacks(from, self.all_occupied),
                    _ => queen_attacks(from, self.all_occupied),
                };
                let mut targets = attacks & !self.occupied[us.index()] & masks.checkmask;
                // A pinned slider stays on the king-pinner line. For a
                // bishop pinned orthogonally (or a rook diagonally) the
                // intersection is empty, which is exactly right.
                if masks.pinned().contains(from) {
                    targets &= self.pin_ray(us, from);
                }
                self.push_targets(from, targets, mode, moves);
            }
        }
    }

    #[inline]
    pub(super) fn push_targets(
        &self,
        from: Square,
        targets: Bitboard,
        mode: GenMode,
        moves: &mut MoveList,
    ) {
        let enemy = self.occupied[(!self.side_to_move()).index()];
        if mode != GenMode::Quiets {
            for to in (targets & enemy).iter() {
                moves.push(Move::new(from, to, MoveFlag::Capture));
            }
        }
        if mode != GenMode::Captures {
            for to in (targets & !self.all_occupied).iter() {
                moves.push(Move::new(from, to, MoveFlag::Quiet));
            }
        }
    }
}
