//! Lazy SMP: worker threads search the same position independently,
//! coordinated only through the shared transposition table and the
//! shared stop flag. Entries race; a torn read shows up as a key
//! mismatch and is treated as a miss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use log::debug;

use super::alphabeta::SearchContext;
use super::constants::{DRAW, MATE, MAX_PLY, STOP_POLL_INTERVAL};
use super::tablebase::within_probe_limit;
use super::{SearchLimits, SearchResult, SearchSettings};
use crate::board::eval::evaluate;
use crate::board::{Board, Move};
use crate::tt::TranspositionTable;

/// Worker stack size; the search recurses deep enough that the
/// default thread stack is not safe.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Helpers alternate between the target depth and one deeper, feeding
/// the table entries the main thread would otherwise compute itself.
fn helper_depth(max_depth: u32, worker_id: usize) -> u32 {
    (max_depth + (worker_id as u32 & 1)).min(MAX_PLY as u32 - 1)
}

/// Run a full search and return exactly one result.
///
/// The calling thread acts as the main worker: it owns time
/// management and progress reporting. On return the stop flag has
/// been set to collect the helpers; callers reset it before reuse.
pub fn run_search(
    board: &Board,
    tt: &Arc<TranspositionTable>,
    limits: &SearchLimits,
    settings: &SearchSettings,
) -> SearchResult {
    tt.new_search();
    let max_depth = if limits.depth == 0 {
        MAX_PLY as u32 - 1
    } else {
        limits.depth.min(MAX_PLY as u32 - 1)
    };

    // A tablebase best move at the root outranks anything the search
    // could conclude.
    if let Some(tb) = &settings.tablebase {
        if within_probe_limit(tb.as_ref(), board) {
            if let Some(mv) = tb.probe_dtz(board) {
                debug!("root tablebase hit: {mv}");
                return SearchResult {
                    best_move: Some(mv),
                    ponder_move: None,
                    score: DRAW,
                    depth: 0,
                    nodes: 0,
                };
            }
        }
    }

    let legal = board.generate_moves();
    if legal.is_empty() {
        let score = if board.in_check(board.side_to_move()) {
            -MATE
        } else {
            DRAW
        };
        return SearchResult {
            best_move: None,
            ponder_move: None,
            score,
            depth: 0,
            nodes: 0,
        };
    }
    if legal.len() == 1 {
        return SearchResult {
            best_move: Some(legal[0]),
            ponder_move: None,
            score: evaluate(board),
            depth: 0,
            nodes: 0,
        };
    }

    let shared_nodes = Arc::new(AtomicU64::new(0));
    let threads = settings.threads.max(1);
    debug!("search start: depth {max_depth}, {threads} thread(s)");

    let mut helpers = Vec::with_capacity(threads.saturating_sub(1));
    for worker_id in 1..threads {
        let board = board.clone();
        let tt = Arc::clone(tt);
        let stop = Arc::clone(&limits.stop);
        let clock = Arc::clone(&limits.clock);
        let tablebase = settings.tablebase.clone();
        let shared_nodes = Arc::clone(&shared_nodes);
        let node_limit = limits.nodes;
        let depth = helper_depth(max_depth, worker_id);

        let handle = thread::Builder::new()
            .name(format!("search-{worker_id}"))
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let mut ctx = SearchContext::new(
                    board,
                    &tt,
                    tablebase.as_deref(),
                    &stop,
                    &clock,
                    &shared_nodes,
                    node_limit,
                );
                ctx.iterative_deepening(depth, false, None);
                shared_nodes.fetch_add(ctx.nodes % STOP_POLL_INTERVAL, Ordering::Relaxed);
            })
            .expect("failed to spawn search worker");
        helpers.push(handle);
    }

    let mut ctx = SearchContext::new(
        board.clone(),
        tt,
        settings.tablebase.as_deref(),
        &limits.stop,
        &limits.clock,
        &shared_nodes,
        limits.nodes,
    );
    let (best, score, depth) =
        ctx.iterative_deepening(max_depth, true, settings.info_callback.as_ref());
    shared_nodes.fetch_add(ctx.nodes % STOP_POLL_INTERVAL, Ordering::Relaxed);

    limits.stop.store(true, Ordering::Relaxed);
    for handle in helpers {
        let _ = handle.join();
    }

    // An interrupted depth-1 iteration can leave no root move; any
    // legal move beats resigning by silence.
    let best_move = if best.is_null() { legal[0] } else { best };
    let ponder_move = extract_ponder(board, tt, best_move);
    let nodes = shared_nodes.load(Ordering::Relaxed);
    debug!("search done: {best_move} score {score} depth {depth} nodes {nodes}");

    SearchResult {
        best_move: Some(best_move),
        ponder_move,
        score,
        depth,
        nodes,
    }
}

/// The expected reply: play the best move and ask the table.
fn extract_ponder(board: &Board, tt: &TranspositionTable, best_move: Move) -> Option<Move> {
    let mut board = board.clone();
    board.make_move(best_move);
    tt.probe(board.hash())
        .and_then(|entry| entry.best_move())
        .filter(|&mv| board.is_legal_move(mv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn depth_limited(depth: u32) -> SearchLimits {
        SearchLimits {
            depth,
            ..SearchLimits::default()
        }
    }

    fn search_fen(fen: &str, depth: u32, threads: usize) -> SearchResult {
        let board: Board = fen.parse().unwrap();
        let tt = Arc::new(TranspositionTable::new(4));
        let settings = SearchSettings {
            threads,
            ..SearchSettings::default()
        };
        run_search(&board, &tt, &depth_limited(depth), &settings)
    }

    #[test]
    fn single_thread_finds_mate_in_one() {
        let result = search_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4, 1);
        assert_eq!(result.best_move.unwrap().to_string(), "a1a8");
        assert_eq!(result.score, MATE - 1);
        assert!(result.nodes > 0 || result.depth > 0);
    }

    #[test]
    fn parallel_search_returns_a_legal_move() {
        let board = Board::new();
        let result = search_fen(&board.to_fen(), 6, 4);
        let best = result.best_move.unwrap();
        assert!(board.is_legal_move(best));
    }

    #[test]
    fn checkmated_position_reports_no_move() {
        // Back-rank mate already delivered, black to move.
        let result = search_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", 4, 1);
        assert!(result.best_move.is_none());
        assert_eq!(result.score, -MATE);
    }

    #[test]
    fn stalemate_reports_draw_score() {
        let result = search_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4, 1);
        assert!(result.best_move.is_none());
        assert_eq!(result.score, DRAW);
    }

    #[test]
    fn single_legal_move_short_circuits() {
        // The rook covers b7 and b8, leaving Ka7 as the only move.
        let result = search_fen("k7/8/2K5/8/8/8/8/1R6 b - - 0 1", 6, 1);
        assert_eq!(result.best_move.unwrap().to_string(), "a8a7");
        assert_eq!(result.depth, 0);
    }

    #[test]
    fn fixed_depth_single_thread_is_reproducible() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
        let a = search_fen(fen, 6, 1);
        let b = search_fen(fen, 6, 1);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
    }
}
