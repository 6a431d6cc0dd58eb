//! Iterative deepening with aspiration windows and soft time control.

use std::sync::atomic::Ordering;
use std::time::Instant;

use super::alphabeta::SearchContext;
use super::constants::{
    ASPIRATION_DELTA, ASPIRATION_MIN_DEPTH, INFINITE, MATE, MATE_IN_MAX, MAX_PLY,
    STOP_POLL_INTERVAL,
};
use super::{SearchInfoCallback, SearchIterationInfo};
use crate::board::Move;

impl SearchContext<'_> {
    /// Deepen until the depth cap, the clock, or the stop flag ends
    /// the search. Returns the best root move with its score and the
    /// last completed depth.
    ///
    /// Only the thread that manages time honors the soft deadline;
    /// helpers run until stopped.
    pub(super) fn iterative_deepening(
        &mut self,
        max_depth: u32,
        manage_time: bool,
        callback: Option<&SearchInfoCallback>,
    ) -> (Move, i32, u32) {
        let (start, soft, _) = self.clock.snapshot();
        let mut score = -INFINITE;
        let mut completed_depth = 0;
        let mut prev_best = Move::NULL;
        let mut prev_score = -INFINITE;
        let mut stability = 0u32;

        for depth in 1..=max_depth.min(MAX_PLY as u32 - 1) {
            if self.aborted || self.stop.load(Ordering::Relaxed) {
                break;
            }

            // Soft deadline, scaled by how settled the best move is
            // and whether the score just dropped.
            if manage_time && depth > 4 {
                if let Some(soft_at) = soft {
                    let mut budget = soft_at.saturating_duration_since(start);
                    if stability < 2 {
                        budget = budget * 13 / 10;
                    } else if stability >= 5 {
                        budget = budget * 4 / 5;
                    }
                    if score < prev_score - 30 {
                        budget = budget * 7 / 5;
                    }
                    if Instant::now() >= start + budget {
                        break;
                    }
                }
            }

            let mut delta = ASPIRATION_DELTA;
            let (mut alpha, mut beta) = if depth >= ASPIRATION_MIN_DEPTH {
                ((score - delta).max(-INFINITE), (score + delta).min(INFINITE))
            } else {
                (-INFINITE, INFINITE)
            };

            loop {
                let s = self.alphabeta(depth as i32, alpha, beta, 0, true);
                if self.aborted {
                    break;
                }
                if s <= alpha {
                    beta = (alpha + beta) / 2;
                    alpha = (s - delta).max(-INFINITE);
                } else if s >= beta {
                    beta = (s + delta).min(INFINITE);
                } else {
                    score = s;
                    break;
                }
                delta *= 2;
                if delta > 1000 {
                    alpha = -INFINITE;
                    beta = INFINITE;
                }
            }

            if self.aborted {
                break;
            }
            completed_depth = depth;

            if self.root_best == prev_best && !self.root_best.is_null() {
                stability = stability.saturating_add(1);
            } else {
                stability = 0;
            }
            prev_best = self.root_best;
            prev_score = score;

            if let Some(cb) = callback {
                let nodes = self.shared_nodes.load(Ordering::Relaxed)
                    + self.nodes % STOP_POLL_INTERVAL;
                let time_ms = start.elapsed().as_millis() as u64;
                let mate_in = if score.abs() < MATE_IN_MAX {
                    None
                } else if score > 0 {
                    Some((MATE - score + 1) / 2)
                } else {
                    Some(-(MATE + score + 1) / 2)
                };
                let info = SearchIterationInfo {
                    depth,
                    seldepth: self.seldepth,
                    score,
                    mate_in,
                    nodes,
                    nps: nodes * 1000 / time_ms.max(1),
                    hashfull: self.tt.hashfull_per_mille(),
                    time_ms,
                    pv: self.extract_pv(depth as usize),
                };
                cb(&info);
            }

            // Nothing can outscore a found mate; deepening only burns
            // the clock.
            if manage_time && score.abs() >= MATE_IN_MAX && depth >= 8 {
                break;
            }
        }

        (self.root_best, self.root_score, completed_depth)
    }

    /// Walk the table from the current position to rebuild the
    /// principal variation as a move string. Cycles are cut by
    /// tracking visited hashes.
    fn extract_pv(&mut self, max_len: usize) -> String {
        let mut pv = String::new();
        let mut seen = Vec::with_capacity(max_len);
        let mut undo = Vec::with_capacity(max_len);

        for _ in 0..max_len {
            let hash = self.board.hash();
            if seen.contains(&hash) {
                break;
            }
            seen.push(hash);

            let Some(mv) = self.tt.probe(hash).and_then(|entry| entry.best_move()) else {
                break;
            };
            if !self.board.is_legal_move(mv) {
                break;
            }
            if !pv.is_empty() {
                pv.push(' ');
            }
            pv.push_str(&mv.to_string());
            undo.push((mv, self.board.make_move(mv)));
        }

        for (mv, info) in undo.into_iter().rev() {
            self.board.unmake_move(mv, &info);
        }
        pv
    }
}
