//! The main alpha-beta search.
//!
//! One `SearchContext` per worker thread. Nodes run a fixed pipeline:
//! stop poll, draw checks, mate-distance pruning, TT probe, tablebase
//! probe, static eval, pre-loop pruning (razoring, reverse futility,
//! null move), then the staged move loop with singular extensions,
//! PVS, and late move reductions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

use super::constants::{
    DRAW, INFINITE, MATE, MATE_IN_MAX, MAX_PLY, NULL_MOVE_REDUCTION, RAZOR_MARGIN, RFP_MARGIN,
    RFP_MAX_DEPTH, SEE_CAPTURE_MARGIN, SEE_PRUNE_MAX_DEPTH, SINGULAR_MARGIN, SINGULAR_MIN_DEPTH,
    STOP_POLL_INTERVAL,
};
use super::history::{HistoryTables, PrevMove};
use super::picker::MovePicker;
use super::tablebase::{within_probe_limit, Tablebase, Wdl};
use super::SearchClock;
use crate::board::eval::evaluate;
use crate::board::{Board, Move};
use crate::tt::{score_from_tt, score_to_tt, Bound, TranspositionTable};

/// Reduction by depth and move number, log-scaled.
static LMR_TABLE: Lazy<[[u8; 64]; 64]> = Lazy::new(|| {
    let mut table = [[0u8; 64]; 64];
    for (depth, row) in table.iter_mut().enumerate().skip(1) {
        for (played, cell) in row.iter_mut().enumerate().skip(1) {
            let r = 0.5 + (depth as f64).ln() * (played as f64).ln() / 2.5;
            *cell = r as u8;
        }
    }
    table
});

fn lmr_reduction(depth: i32, played: usize) -> i32 {
    i32::from(LMR_TABLE[depth.clamp(0, 63) as usize][played.min(63)])
}

/// Per-ply search state. Frames below ply 0 exist so `ply - 2`
/// lookback never branches.
#[derive(Clone, Copy)]
struct StackFrame {
    static_eval: i32,
    played: PrevMove,
    excluded: Move,
    killers: [Move; 2],
}

const EMPTY_FRAME: StackFrame = StackFrame {
    static_eval: 0,
    played: PrevMove::NONE,
    excluded: Move::NULL,
    killers: [Move::NULL; 2],
};

const STACK_LOOKBACK: usize = 2;

/// Search state owned by one worker thread. The board is the worker's
/// private copy; only the transposition table and the stop flag are
/// shared.
pub(super) struct SearchContext<'a> {
    pub board: Board,
    pub tt: &'a TranspositionTable,
    pub tables: HistoryTables,
    pub tablebase: Option<&'a dyn Tablebase>,
    pub stop: &'a AtomicBool,
    pub clock: &'a SearchClock,
    pub shared_nodes: &'a AtomicU64,
    pub node_limit: u64,
    pub nodes: u64,
    pub seldepth: u32,
    pub root_best: Move,
    pub root_score: i32,
    pub aborted: bool,
    stack: Vec<StackFrame>,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        board: Board,
        tt: &'a TranspositionTable,
        tablebase: Option<&'a dyn Tablebase>,
        stop: &'a AtomicBool,
        clock: &'a SearchClock,
        shared_nodes: &'a AtomicU64,
        node_limit: u64,
    ) -> Self {
        SearchContext {
            board,
            tt,
            tables: HistoryTables::new(),
            tablebase,
            stop,
            clock,
            shared_nodes,
            node_limit,
            nodes: 0,
            seldepth: 0,
            root_best: Move::NULL,
            root_score: -INFINITE,
            aborted: false,
            stack: vec![EMPTY_FRAME; MAX_PLY + STACK_LOOKBACK + 2],
        }
    }

    fn frame(&self, ply: usize) -> &StackFrame {
        &self.stack[ply + STACK_LOOKBACK]
    }

    fn frame_mut(&mut self, ply: usize) -> &mut StackFrame {
        &mut self.stack[ply + STACK_LOOKBACK]
    }

    fn prev(&self, ply: usize) -> PrevMove {
        self.stack[ply + STACK_LOOKBACK - 1].played
    }

    /// Poll the stop flag, node budget, and clock every
    /// `STOP_POLL_INTERVAL` nodes. Once set, `aborted` sticks for the
    /// rest of the search and every node returns immediately.
    pub(super) fn should_abort(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if self.nodes % STOP_POLL_INTERVAL == 0 {
            self.shared_nodes
                .fetch_add(STOP_POLL_INTERVAL, Ordering::Relaxed);
            if self.stop.load(Ordering::Relaxed) {
                self.aborted = true;
            } else if self.node_limit > 0
                && self.shared_nodes.load(Ordering::Relaxed) >= self.node_limit
            {
                self.aborted = true;
            } else if let Some(hard) = self.clock.hard_deadline() {
                if Instant::now() >= hard {
                    self.aborted = true;
                }
            }
        }
        self.aborted
    }

    /// Draw score with a deterministic one-centipawn jitter so the
    /// search does not oscillate between equivalent repetition lines.
    pub(super) fn draw_score(&self) -> i32 {
        DRAW + 1 - (self.nodes as i32 & 2)
    }

    pub(super) fn is_draw(&self) -> bool {
        self.board.is_fifty_move_draw()
            || self.board.is_repetition(1)
            || self.board.is_insufficient_material()
    }

    #[allow(clippy::too_many_lines)]
    pub(super) fn alphabeta(
        &mut self,
        mut depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        allow_null: bool,
    ) -> i32 {
        let root = ply == 0;
        let is_pv = beta > alpha + 1;

        if depth <= 0 {
            return self.quiesce(alpha, beta, ply);
        }

        self.nodes += 1;
        if self.should_abort() {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply as u32 + 1);

        if !root {
            if self.is_draw() {
                return self.draw_score();
            }
            if ply >= MAX_PLY {
                return evaluate(&self.board);
            }
            // Mate distance pruning: a mate from here can never beat
            // one already found closer to the root.
            alpha = alpha.max(ply as i32 - MATE);
            beta = beta.min(MATE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        let in_check = self.board.in_check(self.board.side_to_move());
        let excluded = self.frame(ply).excluded;

        let mut tt_move = Move::NULL;
        let mut tt_score = None;
        let mut tt_depth = 0;
        let mut tt_bound = Bound::Upper;
        if excluded.is_null() {
            if let Some(entry) = self.tt.probe(self.board.hash()) {
                tt_move = entry.mv;
                tt_depth = i32::from(entry.depth);
                tt_bound = entry.bound;
                let score = score_from_tt(i32::from(entry.score), ply as u32);
                tt_score = Some(score);
                // No cutoffs near the fifty-move horizon, where the
                // same hash can mean a different game-theoretic value.
                if !is_pv && tt_depth >= depth && self.board.halfmove_clock() < 90 {
                    let cutoff = match entry.bound {
                        Bound::Exact => true,
                        Bound::Lower => score >= beta,
                        Bound::Upper => score <= alpha,
                    };
                    if cutoff {
                        return score;
                    }
                }
            }
        }

        if !root && excluded.is_null() {
            if let Some(tb) = self.tablebase {
                if within_probe_limit(tb, &self.board) {
                    if let Some(wdl) = tb.probe_wdl(&self.board) {
                        // Below the mate window so table wins never
                        // masquerade as mates, shrinking with ply so
                        // shorter conversions still order first.
                        let tb_win = MATE_IN_MAX - 100 - ply as i32;
                        let (score, bound) = match wdl {
                            Wdl::Win => (tb_win, Bound::Lower),
                            Wdl::Loss => (-tb_win, Bound::Upper),
                            Wdl::Draw => (DRAW, Bound::Exact),
                        };
                        let cutoff = match bound {
                            Bound::Exact => true,
                            Bound::Lower => score >= beta,
                            Bound::Upper => score <= alpha,
                        };
                        if cutoff {
                            self.tt.store(
                                self.board.hash(),
                                depth as u32,
                                score_to_tt(score, ply as u32),
                                bound,
                                Move::NULL,
                            );
                            return score;
                        }
                    }
                }
            }
        }

        let eval = if in_check {
            ply as i32 - MATE
        } else {
            evaluate(&self.board)
        };
        self.frame_mut(ply).static_eval = eval;
        let improving = !in_check && ply >= 2 && eval > self.frame(ply - 2).static_eval;

        if !is_pv && !in_check && excluded.is_null() {
            // Razoring: eval so far below alpha at shallow depth that
            // only a tactic can save it, so ask quiescence directly.
            if depth <= 3 && eval + RAZOR_MARGIN * depth <= alpha {
                let score = self.quiesce(alpha, beta, ply);
                if score <= alpha {
                    return score;
                }
            }

            // Reverse futility: eval so far above beta that the
            // opponent's best reply cannot pull it back.
            if depth <= RFP_MAX_DEPTH && eval.abs() < MATE_IN_MAX {
                let margin = RFP_MARGIN * depth - if improving { RFP_MARGIN / 2 } else { 0 };
                if eval - margin >= beta {
                    return eval;
                }
            }

            // Null move: hand the opponent a free move; if the reduced
            // search still fails high the position is good enough to
            // cut. Gated on non-pawn material against zugzwang.
            if allow_null
                && depth >= 3
                && eval >= beta
                && self.board.has_non_pawn_material(self.board.side_to_move())
            {
                let r = NULL_MOVE_REDUCTION + depth / 4;
                let info = self.board.make_null_move();
                self.frame_mut(ply).played = PrevMove::NONE;
                let score = -self.alphabeta(depth - 1 - r, -beta, -beta + 1, ply + 1, false);
                self.board.unmake_null_move(info);
                if self.aborted {
                    return 0;
                }
                if score >= beta {
                    // A mate found while a whole move down is not
                    // proven; fall back to beta.
                    return if score >= MATE_IN_MAX { beta } else { score };
                }
            }
        }

        // Internal iterative reduction: no hash move at high depth
        // means the node is cheap to revisit, so don't overinvest now.
        if depth >= 4 && tt_move.is_null() {
            depth -= 1;
        }

        // Singular extension: re-search with the hash move excluded at
        // reduced depth; if nothing comes close, the hash move is
        // forced and deserves an extra ply.
        let mut singular_extension = 0;
        if let Some(tt_score) = tt_score {
            if !root
                && excluded.is_null()
                && depth >= SINGULAR_MIN_DEPTH
                && !tt_move.is_null()
                && tt_depth >= depth - 3
                && tt_bound != Bound::Upper
                && tt_score.abs() < MATE_IN_MAX
            {
                let singular_beta = tt_score - SINGULAR_MARGIN * depth;
                self.frame_mut(ply).excluded = tt_move;
                let score =
                    self.alphabeta((depth - 1) / 2, singular_beta - 1, singular_beta, ply, false);
                self.frame_mut(ply).excluded = Move::NULL;
                if score < singular_beta {
                    singular_extension = 1;
                }
            }
        }

        let killers = self.frame(ply).killers;
        let prev = self.prev(ply);
        let mut picker = MovePicker::new(tt_move, killers, prev);

        let orig_alpha = alpha;
        let mut best_score = -INFINITE;
        let mut best_move = Move::NULL;
        let mut moves_played = 0usize;
        let mut quiets_tried = [Move::NULL; 64];
        let mut quiet_count = 0usize;

        while let Some(mv) = picker.next(&self.board, &self.tables) {
            if mv == excluded {
                continue;
            }
            let is_quiet = !mv.is_noisy();

            if !root && best_score > -MATE_IN_MAX {
                // Late move pruning: quiets this far down the ordering
                // at shallow depth almost never matter.
                if !is_pv && !in_check && is_quiet && depth <= 8 {
                    let limit = ((3 + depth * depth) / if improving { 1 } else { 2 }) as usize;
                    if quiet_count >= limit {
                        continue;
                    }
                }
                // Bad captures at shallow depth.
                if !is_pv
                    && depth <= SEE_PRUNE_MAX_DEPTH
                    && mv.is_capture()
                    && !self.board.see(mv, SEE_CAPTURE_MARGIN * depth)
                {
                    continue;
                }
            }

            let moving_piece = self.board.piece_type_at(mv.from());
            let info = self.board.make_move(mv);
            moves_played += 1;
            if is_quiet && quiet_count < quiets_tried.len() {
                quiets_tried[quiet_count] = mv;
                quiet_count += 1;
            }
            let gives_check = self.board.in_check(self.board.side_to_move());
            self.frame_mut(ply).played = PrevMove {
                mv,
                piece: moving_piece,
            };

            let mut extension = 0;
            if gives_check {
                extension += 1;
            }
            if mv == tt_move {
                extension += singular_extension;
            }
            let new_depth = depth - 1 + extension;

            let mut reduction = 0;
            if moves_played > 2 && depth >= 3 && is_quiet && !in_check && !gives_check {
                reduction = lmr_reduction(depth, moves_played);
                if is_pv {
                    reduction -= 1;
                }
                if !improving {
                    reduction += 1;
                }
                reduction = reduction.clamp(0, (new_depth - 1).max(0));
            }

            let mut score;
            if moves_played == 1 {
                score = -self.alphabeta(new_depth, -beta, -alpha, ply + 1, true);
            } else {
                // PVS: null window first, re-search on improvement.
                score = -self.alphabeta(new_depth - reduction, -alpha - 1, -alpha, ply + 1, true);
                if score > alpha && reduction > 0 {
                    score = -self.alphabeta(new_depth, -alpha - 1, -alpha, ply + 1, true);
                }
                if score > alpha && score < beta {
                    score = -self.alphabeta(new_depth, -beta, -alpha, ply + 1, true);
                }
            }
            self.board.unmake_move(mv, &info);
            if self.aborted {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    if root {
                        self.root_best = mv;
                        self.root_score = score;
                    }
                    if alpha >= beta {
                        if is_quiet {
                            let frame = self.frame_mut(ply);
                            if frame.killers[0] != mv {
                                frame.killers[1] = frame.killers[0];
                                frame.killers[0] = mv;
                            }
                            self.tables.update_quiets(
                                self.board.side_to_move(),
                                prev,
                                mv,
                                &quiets_tried[..quiet_count],
                                depth as u32,
                            );
                        }
                        break;
                    }
                }
            }
        }

        if moves_played == 0 {
            // Under an excluded move a terminal node proves nothing
            // about the position itself.
            if !excluded.is_null() {
                return alpha;
            }
            return if in_check { ply as i32 - MATE } else { DRAW };
        }

        if !self.aborted && excluded.is_null() {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score > orig_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(
                self.board.hash(),
                depth as u32,
                score_to_tt(best_score, ply as u32),
                bound,
                best_move,
            );
        }

        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn run_fixed_depth(fen: &str, depth: i32) -> (Move, i32) {
        let board: Board = fen.parse().unwrap();
        let tt = TranspositionTable::new(1);
        let stop = AtomicBool::new(false);
        let clock = SearchClock::infinite();
        let shared_nodes = AtomicU64::new(0);
        let mut ctx = SearchContext::new(board, &tt, None, &stop, &clock, &shared_nodes, 0);
        ctx.alphabeta(depth, -INFINITE, INFINITE, 0, true);
        (ctx.root_best, ctx.root_score)
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let (best, score) = run_fixed_depth("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4);
        assert_eq!(best.to_string(), "a1a8");
        assert_eq!(score, MATE - 1);
    }

    #[test]
    fn finds_ladder_mate_in_two() {
        // Two rooks on the second rank ladder the king into the corner.
        let (_, score) = run_fixed_depth("7k/8/8/8/8/8/RR6/7K w - - 0 1", 6);
        assert_eq!(score, MATE - 3);
    }

    #[test]
    fn takes_the_hanging_queen() {
        let (best, _) = run_fixed_depth(
            "rnb1kb1r/pppp1ppp/5n2/4q3/8/5N2/PPPPPPPP/RNBQKB1R w KQkq - 0 1",
            5,
        );
        assert_eq!(best.to_string(), "f3e5");
    }

    #[test]
    fn fixed_depth_search_is_deterministic() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
        let first = run_fixed_depth(fen, 6);
        let second = run_fixed_depth(fen, 6);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}
