//! Quiescence search: resolve captures until the position is quiet
//! enough for the static eval to be trusted. In check every evasion is
//! searched; otherwise stand pat bounds the node and SEE-losing
//! captures are skipped outright.

use super::alphabeta::SearchContext;
use super::constants::{INFINITE, MATE, MAX_PLY};
use super::picker::MovePicker;
use crate::board::eval::evaluate;

impl SearchContext<'_> {
    pub(super) fn quiesce(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.nodes += 1;
        if self.should_abort() {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply as u32 + 1);

        if self.is_draw() {
            return self.draw_score();
        }
        if ply >= MAX_PLY {
            return evaluate(&self.board);
        }

        let in_check = self.board.in_check(self.board.side_to_move());
        let mut best_score = if in_check {
            -INFINITE
        } else {
            let stand_pat = evaluate(&self.board);
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            stand_pat
        };

        let mut picker = MovePicker::new_quiescence(in_check);
        let mut moves_played = 0usize;
        while let Some(mv) = picker.next(&self.board, &self.tables) {
            // Losing captures cannot raise a stand-pat bound.
            if !in_check && !self.board.see(mv, 0) {
                continue;
            }
            let info = self.board.make_move(mv);
            moves_played += 1;
            let score = -self.quiesce(-beta, -alpha, ply + 1);
            self.board.unmake_move(mv, &info);
            if self.aborted {
                return 0;
            }
            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if in_check && moves_played == 0 {
            return ply as i32 - MATE;
        }
        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::search::SearchClock;
    use crate::board::Board;
    use crate::tt::TranspositionTable;
    use std::sync::atomic::{AtomicBool, AtomicU64};

    fn quiesce_root(fen: &str) -> i32 {
        let board: Board = fen.parse().unwrap();
        let tt = TranspositionTable::new(1);
        let stop = AtomicBool::new(false);
        let clock = SearchClock::infinite();
        let shared_nodes = AtomicU64::new(0);
        let mut ctx = SearchContext::new(board, &tt, None, &stop, &clock, &shared_nodes, 0);
        ctx.quiesce(-INFINITE, INFINITE, 0)
    }

    #[test]
    fn quiet_position_returns_static_eval() {
        let board = Board::new();
        let score = quiesce_root(&board.to_fen());
        assert_eq!(score, crate::board::eval::evaluate(&board));
    }

    #[test]
    fn resolves_a_hanging_piece() {
        // White queen takes the undefended rook on d8.
        let score = quiesce_root("3r2k1/8/8/8/8/8/8/3Q2K1 w - - 0 1");
        let quiet = quiesce_root("6k1/8/8/8/8/8/8/3Q2K1 w - - 0 1");
        assert!(score >= quiet - 50);
    }

    #[test]
    fn finds_mate_when_no_evasion_exists() {
        // Back-rank mate already on the board, black to move.
        let score = quiesce_root("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        assert_eq!(score, -MATE);
    }
}
