//! Knight move generation.

use super::super::attack_tables::knight_attacks;
use super::super::masks::MoveMasks;
use super::super::types::{Color, Move, MoveFlag, MoveList, Piece};
use super::super::Board;
use super::GenMode;

impl Board {
    pub(super) fn generate_knight_moves(
        &self,
        us: Color,
        masks: &MoveMasks,
        mode: GenMode,
        moves: &mut MoveList,
    ) {
        let enemy = self.occupied[(!us).index()];
        // A pinned knight never has a legal move: no knight jump stays
        // on its pin ray.
        for from in (self.pieces(us, Piece::Knight) & !masks.pinned()).iter() {
            let targets =
                knight_attacks(from) & !self.occupied[us.index()] & masks.checkmask;
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
}
