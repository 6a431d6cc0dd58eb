//! King move and castling generation.

use super::super::attack_tables::{between, king_attacks};
use super::super::types::{Bitboard, CastleSide, Color, Move, MoveFlag, MoveList, Square};
use super::super::Board;
use super::GenMode;

impl Board {
    pub(super) fn generate_king_moves(&self, us: Color, mode: GenMode, moves: &mut MoveList) {
        let from = self.king_square(us);
        let seen = self.seen_squares(!us);
        let targets = king_attacks(from) & !self.occupied[us.index()] & !seen;
        self.push_targets(from, targets, mode, moves);
    }

    /// Castling: path squares empty (ignoring the king and the castling
    /// rook themselves, which matters with non-standard rook files),
    /// king's path unattacked, and not currently in check.
    pub(super) fn generate_castle_moves(&self, us: Color, moves: &mut MoveList) {
        let rights = self.castling;
        if !rights.any_for(us) {
            return;
        }
        let king_from = self.king_square(us);
        let back = king_from.rank() as usize * 8;
        let them = !us;

        for side in CastleSide::BOTH {
            if !rights.has(us, side) {
                continue;
            }
            let rook_from = Square::from_index(back + rights.rook_file(us, side) as usize);
            let king_to = Square::from_index(back + side.king_dest_file() as usize);
            let rook_to = Square::from_index(back + side.rook_dest_file() as usize);

            let movers = Bitboard::from_square(king_from) | Bitboard::from_square(rook_from);
            let occupied = self.all_occupied ^ movers;

            let king_path = between(king_from, king_to) | Bitboard::from_square(king_to);
            let rook_path = between(rook_from, rook_to) | Bitboard::from_square(rook_to);
            if ((king_path | rook_path) & occupied).any() {
                continue;
            }
            // The caller already knows the king is not in check.
            if king_path.iter().any(|sq| self.is_square_attacked(sq, them)) {
                continue;
            }

            let flag = match side {
                CastleSide::King => MoveFlag::KingCastle,
                CastleSide::Queen => MoveFlag::QueenCastle,
            };
            moves.push(Move::new(king_from, king_to, flag));
        }
    }
}
