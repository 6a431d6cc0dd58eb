//! Endgame tablebase seam.
//!
//! The search only ever talks to this trait; no probing backend ships
//! with the crate. A missing or failing probe is never an error, the
//! search just falls back to its own evaluation.

use crate::board::{Board, Move};

/// Win/draw/loss from the side to move's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wdl {
    Win,
    Draw,
    Loss,
}

pub trait Tablebase: Send + Sync {
    /// Largest total piece count the backend covers. Positions above
    /// this are never probed.
    fn max_pieces(&self) -> u32;

    /// Game-theoretic outcome, `None` when the position is not in the
    /// tables.
    fn probe_wdl(&self, board: &Board) -> Option<Wdl>;

    /// Best root move under the 50-move rule, `None` when unknown.
    fn probe_dtz(&self, board: &Board) -> Option<Move>;
}

/// True when the position is small enough for `tb` to know about.
pub(super) fn within_probe_limit(tb: &dyn Tablebase, board: &Board) -> bool {
    board.occupied().count() <= tb.max_pieces()
}
