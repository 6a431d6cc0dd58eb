//! Legal move generation.
//!
//! Generation is fully legal, no make/undo filtering: non-king moves
//! are intersected with the checkmask and the mover's pin ray, king
//! moves avoid enemy-seen squares, and en passant gets an explicit
//! discovered-check test. Double check short-circuits to king moves.

mod kings;
mod knights;
mod pawns;
mod sliders;

use super::types::{Move, MoveList};
use super::Board;

/// Which subset of legal moves to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenMode {
    /// Every legal move.
    All,
    /// Captures and promotions (the quiescence set).
    Captures,
    /// Everything else.
    Quiets,
}

impl Board {
    /// All legal moves in the current position.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        self.generate(GenMode::All)
    }

    /// Captures and promotions only.
    #[must_use]
    pub fn generate_captures(&self) -> MoveList {
        self.generate(GenMode::Captures)
    }

    #[must_use]
    pub fn generate(&self, mode: GenMode) -> MoveList {
        let us = self.side_to_move();
        let masks = self.move_masks(us);
        let mut moves = MoveList::new();

        self.generate_king_moves(us, mode, &mut moves);
        if masks.double_check() {
            return moves;
        }
        self.generate_pawn_moves(us, &masks, mode, &mut moves);
        self.generate_knight_moves(us, &masks, mode, &mut moves);
        self.generate_slider_moves(us, &masks, mode, &mut moves);
        if mode != GenMode::Captures && !masks.in_check() {
            self.generate_castle_moves(us, &mut moves);
        }
        moves
    }

    /// Validate a single move, e.g. one pulled from the transposition
    /// table, against the current position.
    #[must_use]
    pub fn is_legal_move(&self, mv: Move) -> bool {
        !mv.is_null() && self.generate_moves().contains(mv)
    }

    /// Whether the side to move has been checkmated.
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.in_check(self.side_to_move()) && self.generate_moves().is_empty()
    }

    /// Whether the side to move has no legal move while not in check.
    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.in_check(self.side_to_move()) && self.generate_moves().is_empty()
    }

    /// Leaf node count at the given depth. The baseline correctness
    /// oracle for the move generator.
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for &mv in moves.iter() {
            let info = self.make_move(mv);
            nodes += self.perft(depth - 1);
            self.unmake_move(mv, &info);
        }
        nodes
    }

    /// Per-root-move perft breakdown, for diffing against a known-good
    /// engine when a count disagrees.
    pub fn perft_divide(&mut self, depth: u32) -> Vec<(Move, u64)> {
        let moves = self.generate_moves();
        let mut out = Vec::with_capacity(moves.len());
        for &mv in moves.iter() {
            let info = self.make_move(mv);
            let nodes = if depth > 1 { self.perft(depth - 1) } else { 1 };
            self.unmake_move(mv, &info);
            out.push((mv, nodes));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::Piece;

    fn board(fen: &str) -> Board {
        Board::try_from_fen(fen).unwrap()
    }

    fn count(fen: &str) -> usize {
        board(fen).generate_moves().len()
    }

    #[test]
    fn startpos_has_twenty_moves() {
        assert_eq!(Board::new().generate_moves().len(), 20);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Knight on f6 and rook on e8 both check e1... knight d3 + rook e8.
        let b = board("4r3/8/8/8/8/3n4/8/4K2k w - - 0 1");
        let moves = b.generate_moves();
        assert!(moves.iter().all(|m| {
            b.piece_at(m.from()).map(|(_, p)| p) == Some(Piece::King)
        }));
    }

    #[test]
    fn pinned_knight_cannot_move() {
        let b = board("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        let moves = b.generate_moves();
        assert!(moves
            .iter()
            .all(|m| m.from() != "e2".parse().unwrap()));
    }

    #[test]
    fn pinned_rook_slides_along_the_pin_ray() {
        let b = board("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let moves: Vec<Move> = b
            .generate_moves()
            .iter()
            .copied()
            .filter(|m| m.from() == "e2".parse().unwrap())
            .collect();
        // e3 e4 e5 e6 e7 and the capture on e8.
        assert_eq!(moves.len(), 6);
        assert!(moves.iter().all(|m| m.to().file() == 4));
    }

    #[test]
    fn pinned_bishop_keeps_diagonal_moves() {
        let b = board("7k/8/8/8/7b/8/5B2/4K3 w - - 0 1");
        let from: crate::board::Square = "f2".parse().unwrap();
        let moves: Vec<Move> = b
            .generate_moves()
            .iter()
            .copied()
            .filter(|m| m.from() == from)
            .collect();
        // g3 and the capture on h4 only.
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn check_must_be_resolved() {
        // Rook checks on the e-file; block, capture or step aside.
        let b = board("4r2k/8/8/8/8/8/3R4/4K3 w - - 0 1");
        let moves = b.generate_moves();
        for m in moves.iter() {
            assert!(
                m.to().to_string() == "e2"
                    || b.piece_at(m.from()).map(|(_, p)| p) == Some(Piece::King),
                "unexpected move {m}"
            );
        }
    }

    #[test]
    fn en_passant_discovered_check_is_illegal() {
        // Classic horizontal EP pin: both pawns vanish from rank 5 and
        // the rook hits the king.
        let b = board("8/8/8/KPp4r/8/8/8/7k w - c6 0 2");
        let moves = b.generate_moves();
        assert!(moves.iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    fn en_passant_capture_resolving_check_is_found() {
        // The double-pushed pawn itself gives check; EP removes it.
        let b = board("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1");
        let moves = b.generate_moves();
        assert!(moves.iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn castling_through_attacked_square_is_illegal() {
        // Black rook on f8 covers f1: no kingside castle.
        let b = board("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = b.generate_moves();
        assert!(!moves.iter().any(|m| m.is_kingside_castle()));
        assert!(moves.iter().any(|m| m.is_castle()));
    }

    #[test]
    fn castling_with_blocked_path_is_illegal() {
        let b = board("4k3/8/8/8/8/8/8/R2QK2R w KQ - 0 1");
        let moves = b.generate_moves();
        assert!(moves.iter().any(|m| m.is_kingside_castle()));
        assert!(!moves.iter().any(|m| !m.is_kingside_castle() && m.is_castle()));
    }

    #[test]
    fn no_castling_while_in_check() {
        let b = board("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!b.generate_moves().iter().any(|m| m.is_castle()));
    }

    #[test]
    fn promotions_generate_all_four_pieces() {
        let b = board("7k/P7/8/8/8/8/8/7K w - - 0 1");
        let promos = b
            .generate_moves()
            .iter()
            .filter(|m| m.is_promotion())
            .count();
        assert_eq!(promos, 4);
    }

    #[test]
    fn capture_mode_is_the_noisy_subset() {
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let all = b.generate_moves();
        let captures = b.generate_captures();
        let quiets = b.generate(GenMode::Quiets);
        assert_eq!(all.len(), captures.len() + quiets.len());
        assert!(captures.iter().all(|m| m.is_noisy()));
        assert!(quiets.iter().all(|m| !m.is_noisy()));
    }

    #[test]
    fn push_promotions_partition_as_noisy() {
        // A promotion push must land in the capture set, all four
        // pieces of it, and never in the quiet set.
        let b = board("7k/P7/8/8/8/8/8/7K w - - 0 1");
        let all = b.generate_moves();
        let captures = b.generate_captures();
        let quiets = b.generate(GenMode::Quiets);
        assert_eq!(all.len(), captures.len() + quiets.len());
        assert_eq!(captures.iter().filter(|m| m.is_promotion()).count(), 4);
        assert!(quiets.iter().all(|m| !m.is_noisy()));
    }

    #[test]
    fn checkmate_and_stalemate_classification() {
        assert!(board("4k3/4Q3/4K3/8/8/8/8/8 b - - 0 1").is_checkmate());
        assert!(board("4k3/8/3QK3/8/8/8/8/8 b - - 0 1").is_stalemate());
        assert!(!Board::new().is_checkmate());
        assert!(!Board::new().is_stalemate());
    }

    #[test]
    fn is_legal_move_filters_stale_tt_moves() {
        let b = Board::new();
        let good = b.parse_move("e2e4").unwrap();
        assert!(b.is_legal_move(good));
        assert!(!b.is_legal_move(Move::NULL));
        // A move legal in a different position.
        let other = board("4k3/8/8/8/8/8/8/4K2R w - - 0 1")
            .parse_move("h1h8")
            .unwrap();
        assert!(!b.is_legal_move(other));
    }

    #[test]
    fn kiwipete_move_count() {
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(b.generate_moves().len(), 48);
    }

    #[test]
    fn tricky_pin_position_counts() {
        // Position 4 from the usual perft suite.
        assert_eq!(
            count("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1"),
            6
        );
        // Position 3.
        assert_eq!(count("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"), 14);
    }

    #[test]
    fn perft_divide_sums_to_perft() {
        let mut b = Board::new();
        let divide = b.perft_divide(3);
        let total: u64 = divide.iter().map(|(_, n)| n).sum();
        assert_eq!(total, b.perft(3));
        assert_eq!(divide.len(), 20);
    }

    #[test]
    fn quiets_mode_respects_check() {
        let b = board("4r2k/8/8/8/8/8/3R4/4K3 w - - 0 1");
        let quiets = b.generate(GenMode::Quiets);
        assert!(quiets.iter().all(|m| !m.is_capture()));
        // Blocking move d2-e2 must be present.
        assert!(quiets
            .iter()
            .any(|m| m.to() == "e2".parse().unwrap()));
    }
}
