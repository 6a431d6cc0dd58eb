//! Quiet-move ordering state: butterfly history, counter moves, and
//! continuation history. One instance per search thread; killers live
//! in the per-ply search stack instead.

use super::constants::HISTORY_MAX;
use crate::board::{Color, Move, Piece};

/// Gravity update: pull the entry toward saturation in proportion to
/// how far from it the entry already is, so values decay on their own
/// instead of needing a periodic halving pass.
fn gravity(entry: &mut i32, bonus: i32) {
    *entry += bonus - *entry * bonus.abs() / HISTORY_MAX;
}

fn stat_bonus(depth: u32) -> i32 {
    let d = depth as i32;
    (d * d + 2 * d - 2).min(HISTORY_MAX)
}

fn stat_malus(depth: u32) -> i32 {
    let d = depth as i32;
    -(d * d).min(HISTORY_MAX)
}

const fn from_to(mv: Move) -> usize {
    mv.from().index() * 64 + mv.to().index()
}

/// Per-thread move ordering tables.
pub struct HistoryTables {
    /// Butterfly history, indexed `[side][from * 64 + to]`.
    history: Box<[[i32; 4096]; 2]>,
    /// Refutation of the previous move, indexed `[prev_from][prev_to]`.
    counters: Box<[[Move; 64]; 64]>,
    /// Continuation history keyed on the previous move's piece and
    /// destination, indexed `[piece * 64 + prev_to][from * 64 + to]`.
    continuation: Box<[[i16; 4096]; 384]>,
}

/// Previous-move context threaded into ordering and updates.
#[derive(Clone, Copy)]
pub struct PrevMove {
    pub mv: Move,
    pub piece: Option<Piece>,
}

impl PrevMove {
    pub const NONE: PrevMove = PrevMove {
        mv: Move::NULL,
        piece: None,
    };

    fn continuation_index(&self) -> Option<usize> {
        let piece = self.piece?;
        if self.mv.is_null() {
            return None;
        }
        Some(piece.index() * 64 + self.mv.to().index())
    }
}

impl HistoryTables {
    #[must_use]
    pub fn new() -> Self {
        HistoryTables {
            history: Box::new([[0; 4096]; 2]),
            counters: Box::new([[Move::NULL; 64]; 64]),
            continuation: Box::new([[0; 4096]; 384]),
        }
    }

    /// Combined ordering score for a quiet move.
    #[must_use]
    pub fn quiet_score(&self, side: Color, prev: PrevMove, mv: Move) -> i32 {
        let mut score = self.history[side.index()][from_to(mv)];
        if let Some(idx) = prev.continuation_index() {
            score += i32::from(self.continuation[idx][from_to(mv)]);
        }
        score
    }

    /// The stored refutation of `prev`, if any.
    #[must_use]
    pub fn counter(&self, prev: PrevMove) -> Move {
        if prev.mv.is_null() {
            Move::NULL
        } else {
            self.counters[prev.mv.from().index()][prev.mv.to().index()]
        }
    }

    /// Reward the quiet move that failed high and penalize the other
    /// quiets tried at the same node. `tried` may include the cutoff
    /// move; it is skipped.
    pub fn update_quiets(
        &mut self,
        side: Color,
        prev: PrevMove,
        cutoff: Move,
        tried: &[Move],
        depth: u32,
    ) {
        let bonus = stat_bonus(depth);
        let malus = stat_malus(depth);

        gravity(&mut self.history[side.index()][from_to(cutoff)], bonus);
        for &mv in tried {
            if mv != cutoff {
                gravity(&mut self.history[side.index()][from_to(mv)], malus);
            }
        }

        if let Some(idx) = prev.continuation_index() {
            Self::gravity_i16(&mut self.continuation[idx][from_to(cutoff)], bonus);
            for &mv in tried {
                if mv != cutoff {
                    Self::gravity_i16(&mut self.continuation[idx][from_to(mv)], malus);
                }
            }
        }

        if !prev.mv.is_null() {
            self.counters[prev.mv.from().index()][prev.mv.to().index()] = cutoff;
        }
    }

    fn gravity_i16(entry: &mut i16, bonus: i32) {
        let mut wide = i32::from(*entry);
        gravity(&mut wide, bonus);
        *entry = wide.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
    }
}

impl Default for HistoryTables {
    fn default() -> Self {
        HistoryTables::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MoveFlag, Square};

    fn quiet(from: &str, to: &str) -> Move {
        Move::new(
            from.parse::<Square>().unwrap(),
            to.parse::<Square>().unwrap(),
            MoveFlag::Quiet,
        )
    }

    #[test]
    fn cutoff_move_gains_and_tried_moves_lose() {
        let mut tables = HistoryTables::new();
        let good = quiet("g1", "f3");
        let bad = quiet("b1", "a3");

        tables.update_quiets(Color::White, PrevMove::NONE, good, &[bad], 6);

        assert!(tables.quiet_score(Color::White, PrevMove::NONE, good) > 0);
        assert!(tables.quiet_score(Color::White, PrevMove::NONE, bad) < 0);
        // The other side's table is untouched.
        assert_eq!(tables.quiet_score(Color::Black, PrevMove::NONE, good), 0);
    }

    #[test]
    fn history_saturates_below_cap() {
        let mut tables = HistoryTables::new();
        let mv = quiet("e2", "e4");
        for _ in 0..1000 {
            tables.update_quiets(Color::White, PrevMove::NONE, mv, &[], 12);
        }
        let score = tables.quiet_score(Color::White, PrevMove::NONE, mv);
        assert!(score > 0 && score <= HISTORY_MAX);
    }

    #[test]
    fn counter_move_tracks_previous_move() {
        let mut tables = HistoryTables::new();
        let prev = PrevMove {
            mv: quiet("e7", "e5"),
            piece: Some(Piece::Pawn),
        };
        let refutation = quiet("g1", "f3");
        tables.update_quiets(Color::White, prev, refutation, &[], 4);
        assert_eq!(tables.counter(prev), refutation);
        assert_eq!(tables.counter(PrevMove::NONE), Move::NULL);
    }
}
