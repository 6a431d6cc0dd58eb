//! Attack queries and checkmask/pinmask derivation.
//!
//! The move generator is fully legal: instead of making each
//! pseudo-legal move and testing for check, it derives a checkmask
//! (squares that resolve the current check), two pinmasks (rays of
//! diagonally and orthogonally pinned pieces) and the set of squares
//! the enemy sees. Non-king moves are intersected with the checkmask
//! and pin rays; king moves avoid seen squares.

use super::attack_tables::{
    between, bishop_attacks, king_attacks, knight_attacks, line, pawn_attacks, queen_attacks,
    rook_attacks,
};
use super::types::{Bitboard, Color, Piece, Square};
use super::Board;

/// Check-resolution and pin information for the side to move.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MoveMasks {
    /// Pieces currently giving check.
    pub(crate) checkers: Bitboard,
    /// Squares a non-king move may land on: all-ones with no checker,
    /// the checker plus its blocking ray with one, empty with two.
    pub(crate) checkmask: Bitboard,
    /// Squares of friendly pieces pinned along a diagonal.
    pub(crate) pin_diag: Bitboard,
    /// Squares of friendly pieces pinned along a rank or file.
    pub(crate) pin_orth: Bitboard,
}

impl MoveMasks {
    #[inline]
    pub(crate) fn in_check(&self) -> bool {
        self.checkers.any()
    }

    #[inline]
    pub(crate) fn double_check(&self) -> bool {
        self.checkers.count() > 1
    }

    #[inline]
    pub(crate) fn pinned(&self) -> Bitboard {
        self.pin_diag | self.pin_orth
    }
}

impl Board {
    /// All pieces of `by` attacking `sq` under the given occupancy.
    ///
    /// Taking occupancy as a parameter lets SEE and the en passant
    /// legality test query hypothetical positions.
    #[must_use]
    pub(crate) fn attackers_to(&self, sq: Square, by: Color, occupied: Bitboard) -> Bitboard {
        let c = by.index();
        let queens = self.pieces[c][Piece::Queen.index()];
        // A pawn of `by` attacks sq iff a pawn of the other color on sq
        // would attack the pawn's square.
        (pawn_attacks(!by, sq) & self.pieces[c][Piece::Pawn.index()])
            | (knight_attacks(sq) & self.pieces[c][Piece::Knight.index()])
            | (bishop_attacks(sq, occupied) & (self.pieces[c][Piece::Bishop.index()] | queens))
            | (rook_attacks(sq, occupied) & (self.pieces[c][Piece::Rook.index()] | queens))
            | (king_attacks(sq) & self.pieces[c][Piece::King.index()])
    }

    #[inline]
    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.attackers_to(sq, by, self.all_occupied).any()
    }

    /// Every square attacked by `attacker`, with the defending king
    /// removed from occupancy so slider attacks extend through it.
    /// A king stepping along a checking ray is otherwise wrongly
    /// counted as escaping.
    #[must_use]
    pub(crate) fn seen_squares(&self, attacker: Color) -> Bitboard {
        let c = attacker.index();
        let defender_king = self.pieces[(!attacker).index()][Piece::King.index()];
        let occupied = self.all_occupied ^ defender_king;

        let mut seen = king_attacks(self.king_square(attacker));
        for sq in self.pieces[c][Piece::Pawn.index()].iter() {
            seen |= pawn_attacks(attacker, sq);
        }
        for sq in self.pieces[c][Piece::Knight.index()].iter() {
            seen |= knight_attacks(sq);
        }
        let queens = self.pieces[c][Piece::Queen.index()];
        for sq in (self.pieces[c][Piece::Bishop.index()] | queens).iter() {
            seen |= bishop_attacks(sq, occupied);
        }
        for sq in (self.pieces[c][Piece::Rook.index()] | queens).iter() {
            seen |= rook_attacks(sq, occupied);
        }
        seen
    }

    /// Checkmask and pinmasks for `color`'s king.
    #[must_use]
    pub(crate) fn move_masks(&self, color: Color) -> MoveMasks {
        let king = self.king_square(color);
        let us = self.occupied[color.index()];
        let them = (!color).index();
        let enemy_queens = self.pieces[them][Piece::Queen.index()];

        let mut checkers = (pawn_attacks(color, king) & self.pieces[them][Piece::Pawn.index()])
            | (knight_attacks(king) & self.pieces[them][Piece::Knight.index()]);
        let mut checkmask = checkers;
        let mut pin_diag = Bitboard::EMPTY;
        let mut pin_orth = Bitboard::EMPTY;

        // Candidate slider attackers on open rays through the king.
        // Zero own blockers on the ray means check, exactly one means a
        // pin, more means neither.
        let diag_snipers = bishop_attacks(king, self.occupied[them])
            & (self.pieces[them][Piece::Bishop.index()] | enemy_queens);
        let orth_snipers = rook_attacks(king, self.occupied[them])
            & (self.pieces[them][Piece::Rook.index()] | enemy_queens);

        for sniper in diag_snipers.iter() {
            let blockers = between(king, sniper) & us;
            match blockers.count() {
                0 => {
                    checkers |= Bitboard::from_square(sniper);
                    checkmask |= between(king, sniper) | Bitboard::from_square(sniper);
                }
                1 => pin_diag |= blockers,
                _ => {}
            }
        }
        for sniper in orth_snipers.iter() {
            let blockers = between(king, sniper) & us;
            match blockers.count() {
                0 => {
                    checkers |= Bitboard::from_square(sniper);
                    checkmask |= between(king, sniper) | Bitboard::from_square(sniper);
                }
                1 => pin_orth |= blockers,
                _ => {}
            }
        }

        let checkmask = match checkers.count() {
            0 => Bitboard::ALL,
            1 => checkmask,
            _ => Bitboard::EMPTY,
        };

        MoveMasks {
            checkers,
            checkmask,
            pin_diag,
            pin_orth,
        }
    }

    /// The ray a pinned piece on `from` may stay on, given `color`'s king.
    #[inline]
    pub(crate) fn pin_ray(&self, color: Color, from: Square) -> Bitboard {
        line(self.king_square(color), from)
    }

    /// Attacks of a piece type from a square under the given occupancy.
    #[inline]
    pub(crate) fn piece_attacks(piece: Piece, from: Square, occupied: Bitboard) -> Bitboard {
        match piece {
            Piece::Pawn => Bitboard::EMPTY,
            Piece::Knight => knight_attacks(from),
            Piece::Bishop => bishop_attacks(from, occupied),
            Piece::Rook => rook_attacks(from, occupied),
            Piece::Queen => queen_attacks(from, occupied),
            Piece::King => king_attacks(from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::try_from_fen(fen).unwrap()
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn startpos_has_no_check_or_pins() {
        let masks = Board::new().move_masks(Color::White);
        assert!(!masks.in_check());
        assert_eq!(masks.checkmask, Bitboard::ALL);
        assert!(masks.pinned().is_empty());
    }

    #[test]
    fn single_slider_check_builds_blocking_ray() {
        // Black rook on e8 checks the white king on e1.
        let board = board("4r2k/8/8/8/8/8/3P1P2/4K3 w - - 0 1");
        let masks = board.move_masks(Color::White);
        assert!(masks.in_check());
        assert!(!masks.double_check());
        assert!(masks.checkers.contains(sq("e8")));
        assert!(masks.checkmask.contains(sq("e4")));
        assert!(masks.checkmask.contains(sq("e8")));
        assert!(!masks.checkmask.contains(sq("d4")));
        assert_eq!(masks.checkmask.count(), 7);
    }

    #[test]
    fn knight_check_has_no_blocking_squares() {
        let board = board("8/8/8/8/8/5n2/8/4K2k w - - 0 1");
        let masks = board.move_masks(Color::White);
        assert!(masks.in_check());
        assert_eq!(masks.checkmask.count(), 1);
        assert!(masks.checkmask.contains(sq("f3")));
    }

    #[test]
    fn double_check_empties_checkmask() {
        // Rook on e8 and bishop on h4 both check e1.
        let board = board("4r3/8/8/8/7b/8/8/4K2k w - - 0 1");
        let masks = board.move_masks(Color::White);
        assert!(masks.double_check());
        assert_eq!(masks.checkmask, Bitboard::EMPTY);
    }

    #[test]
    fn pins_split_by_ray_type() {
        // Rook pins the e2 pawn orthogonally, bishop pins the f2
        // pawn diagonally.
        let board = board("k3r3/8/8/8/7b/8/3PPP2/4K3 w - - 0 1");
        let masks = board.move_masks(Color::White);
        assert!(!masks.in_check());
        assert_eq!(masks.pin_orth.count(), 1);
        assert!(masks.pin_orth.contains(sq("e2")));
        assert_eq!(masks.pin_diag.count(), 1);
        assert!(masks.pin_diag.contains(sq("f2")));
        assert!(!masks.pinned().contains(sq("d2")));
    }

    #[test]
    fn two_blockers_are_not_pinned() {
        let board = board("4r2k/8/8/8/4N3/8/4P3/4K3 w - - 0 1");
        let masks = board.move_masks(Color::White);
        assert!(masks.pinned().is_empty());
    }

    #[test]
    fn seen_squares_extend_through_defending_king() {
        // Rook checks along the e-file; the square behind the checked
        // king must still count as seen or the king could step there.
        let board = board("4r3/8/8/8/4K3/8/8/7k w - - 0 1");
        let seen = board.seen_squares(Color::Black);
        assert!(seen.contains(sq("e4")));
        assert!(seen.contains(sq("e3")));
    }

    #[test]
    fn attackers_to_honors_custom_occupancy() {
        let board = board("8/8/8/8/8/8/4R3/4K2k w - - 0 1");
        // e8 is shielded from e2 by nothing; add a hypothetical blocker.
        let with_blocker = board.all_occupied | Bitboard::from_square(sq("e5"));
        assert!(board
            .attackers_to(sq("e8"), Color::White, board.all_occupied)
            .contains(sq("e2")));
        assert!(board
            .attackers_to(sq("e8"), Color::White, with_blocker)
            .is_empty());
    }
}
