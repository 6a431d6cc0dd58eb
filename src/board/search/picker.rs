//! Staged move picker.
//!
//! Yields the hash move before generating anything, then scores the
//! generated list once and hands out moves by partial selection sort.
//! Most nodes cut off after a move or two, so a full sort would be
//! wasted work.

use super::history::{HistoryTables, PrevMove};
use crate::board::{Board, GenMode, Move, Piece, MAX_MOVES};

/// Captures that win or break even by SEE, and all promotions.
const SCORE_GOOD_CAPTURE: i32 = 1 << 20;
/// Killer and counter slots sit above plain history scores.
const SCORE_KILLER_1: i32 = (1 << 18) + 2;
const SCORE_KILLER_2: i32 = (1 << 18) + 1;
const SCORE_COUNTER: i32 = 1 << 18;
/// SEE-losing captures go below every quiet.
const SCORE_BAD_CAPTURE: i32 = -(1 << 20);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    TtMove,
    Generate,
    Pick,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    prev: PrevMove,
    mode: GenMode,
    moves: [Move; MAX_MOVES],
    scores: [i32; MAX_MOVES],
    len: usize,
    idx: usize,
}

impl MovePicker {
    /// Picker for a main-search node. SEE-losing captures are demoted
    /// below quiets here; quiescence prunes them in its own loop.
    #[must_use]
    pub fn new(tt_move: Move, killers: [Move; 2], prev: PrevMove) -> Self {
        MovePicker {
            stage: Stage::TtMove,
            tt_move,
            killers,
            prev,
            mode: GenMode::All,
            moves: [Move::NULL; MAX_MOVES],
            scores: [0; MAX_MOVES],
            len: 0,
            idx: 0,
        }
    }

    /// Picker for quiescence: captures only unless in check, ordered
    /// purely by MVV-LVA.
    #[must_use]
    pub fn new_quiescence(in_check: bool) -> Self {
        MovePicker {
            stage: Stage::Generate,
            tt_move: Move::NULL,
            killers: [Move::NULL; 2],
            prev: PrevMove::NONE,
            mode: if in_check {
                GenMode::All
            } else {
                GenMode::Captures
            },
            moves: [Move::NULL; MAX_MOVES],
            scores: [0; MAX_MOVES],
            len: 0,
            idx: 0,
        }
    }

    /// The next-best remaining move, or `None` when exhausted. The
    /// board must be in the same position the picker was created for.
    pub fn next(&mut self, board: &Board, tables: &HistoryTables) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::Generate;
                    if !self.tt_move.is_null() && board.is_legal_move(self.tt_move) {
                        return Some(self.tt_move);
                    }
                }
                Stage::Generate => {
                    self.generate(board, tables);
                    self.stage = Stage::Pick;
                }
                Stage::Pick => {
                    if self.idx >= self.len {
                        self.stage = Stage::Done;
                        return None;
                    }
                    let mut best = self.idx;
                    for i in self.idx + 1..self.len {
                        if self.scores[i] > self.scores[best] {
                            best = i;
                        }
                    }
                    self.moves.swap(self.idx, best);
                    self.scores.swap(self.idx, best);
                    let mv = self.moves[self.idx];
                    self.idx += 1;
                    return Some(mv);
                }
                Stage::Done => return None,
            }
        }
    }

    fn generate(&mut self, board: &Board, tables: &HistoryTables) {
        let list = board.generate(self.mode);
        for &mv in list.iter() {
            if mv == self.tt_move {
                continue;
            }
            self.moves[self.len] = mv;
            self.scores[self.len] = self.score_move(board, tables, mv);
            self.len += 1;
        }
    }

    fn score_move(&self, board: &Board, tables: &HistoryTables, mv: Move) -> i32 {
        if mv.is_noisy() {
            let gain = mvv_lva(board, mv);
            if self.mode == GenMode::All && !board.see(mv, 0) {
                SCORE_BAD_CAPTURE + gain
            } else {
                SCORE_GOOD_CAPTURE + gain
            }
        } else if mv == self.killers[0] {
            SCORE_KILLER_1
        } else if mv == self.killers[1] {
            SCORE_KILLER_2
        } else if mv == tables.counter(self.prev) {
            SCORE_COUNTER
        } else {
            tables.quiet_score(board.side_to_move(), self.prev, mv)
        }
    }
}

/// Most-valuable-victim, least-valuable-attacker tiebreak. Promotions
/// count the promoted piece as part of the gain.
fn mvv_lva(board: &Board, mv: Move) -> i32 {
    let victim = if mv.is_en_passant() {
        Piece::Pawn.value()
    } else {
        board.piece_type_at(mv.to()).map_or(0, Piece::value)
    };
    let attacker = board.piece_type_at(mv.from()).map_or(0, Piece::value);
    let promo = mv.promotion().map_or(0, Piece::value);
    victim * 10 - attacker + promo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MoveFlag, Square};

    fn drain(picker: &mut MovePicker, board: &Board, tables: &HistoryTables) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(mv) = picker.next(board, tables) {
            out.push(mv);
        }
        out
    }

    fn mv(from: &str, to: &str, flag: MoveFlag) -> Move {
        Move::new(
            from.parse::<Square>().unwrap(),
            to.parse::<Square>().unwrap(),
            flag,
        )
    }

    #[test]
    fn tt_move_comes_first_and_only_once() {
        let board = Board::new();
        let tables = HistoryTables::new();
        let hash_move = mv("g1", "f3", MoveFlag::Quiet);

        let mut picker = MovePicker::new(hash_move, [Move::NULL; 2], PrevMove::NONE);
        let yielded = drain(&mut picker, &board, &tables);

        assert_eq!(yielded[0], hash_move);
        assert_eq!(yielded.iter().filter(|&&m| m == hash_move).count(), 1);
        assert_eq!(yielded.len(), 20);
    }

    #[test]
    fn illegal_tt_move_is_skipped() {
        let board = Board::new();
        let tables = HistoryTables::new();
        let bogus = mv("e2", "e5", MoveFlag::Quiet);

        let mut picker = MovePicker::new(bogus, [Move::NULL; 2], PrevMove::NONE);
        let yielded = drain(&mut picker, &board, &tables);

        assert_eq!(yielded.len(), 20);
        assert!(!yielded.contains(&bogus));
    }

    #[test]
    fn winning_capture_leads_quiets() {
        // exd5 wins a pawn cleanly.
        let board: Board = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
            .parse()
            .unwrap();
        let tables = HistoryTables::new();

        let mut picker = MovePicker::new(Move::NULL, [Move::NULL; 2], PrevMove::NONE);
        let first = picker.next(&board, &tables).unwrap();
        assert_eq!(first, mv("e4", "d5", MoveFlag::Capture));
    }

    #[test]
    fn losing_capture_sorts_below_quiets() {
        // Qxd6 loses the queen to c7xd6.
        let board: Board = "4k3/2p5/3p4/8/8/8/3Q4/4K3 w - - 0 1".parse().unwrap();
        let tables = HistoryTables::new();

        let mut picker = MovePicker::new(Move::NULL, [Move::NULL; 2], PrevMove::NONE);
        let yielded = drain(&mut picker, &board, &tables);

        assert_eq!(*yielded.last().unwrap(), mv("d2", "d6", MoveFlag::Capture));
    }

    #[test]
    fn killers_outrank_plain_quiets() {
        let board = Board::new();
        let tables = HistoryTables::new();
        let killer = mv("b1", "c3", MoveFlag::Quiet);

        let mut picker = MovePicker::new(Move::NULL, [killer, Move::NULL], PrevMove::NONE);
        let first = picker.next(&board, &tables).unwrap();
        assert_eq!(first, killer);
    }

    #[test]
    fn quiescence_picker_yields_captures_only() {
        let board: Board = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
            .parse()
            .unwrap();
        let tables = HistoryTables::new();

        let mut picker = MovePicker::new_quiescence(false);
        let yielded = drain(&mut picker, &board, &tables);
        assert!(!yielded.is_empty());
        assert!(yielded.iter().all(|m| m.is_noisy()));
    }
}
