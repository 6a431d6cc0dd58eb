//! Alpha-beta search with iterative deepening, a staged move picker,
//! and lazy-SMP parallelism.
//!
//! Entry point is [`run_search`]. Callers own the stop flag and the
//! clock, so a search can be halted or rescheduled (ponder hit) from
//! another thread while it runs.

mod alphabeta;
mod constants;
mod history;
mod iterative;
mod picker;
mod quiescence;
mod smp;
mod tablebase;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub use constants::{DRAW, INFINITE, MATE, MATE_IN_MAX, MAX_PLY};
pub use smp::run_search;
pub use tablebase::{Tablebase, Wdl};

use crate::board::Move;

/// Shared deadline state for one search. Workers poll it; the owner
/// may rewrite the deadlines mid-search, which is how a ponder search
/// turns into a timed one.
pub struct SearchClock {
    start: Mutex<Instant>,
    soft: Mutex<Option<Instant>>,
    hard: Mutex<Option<Instant>>,
}

impl SearchClock {
    #[must_use]
    pub fn new(start: Instant, soft: Option<Instant>, hard: Option<Instant>) -> Self {
        SearchClock {
            start: Mutex::new(start),
            soft: Mutex::new(soft),
            hard: Mutex::new(hard),
        }
    }

    /// A clock with no deadlines.
    #[must_use]
    pub fn infinite() -> Self {
        SearchClock::new(Instant::now(), None, None)
    }

    /// Restart the clock at `now` with deadlines relative to it.
    pub fn restart(&self, soft: Option<Duration>, hard: Option<Duration>) {
        let now = Instant::now();
        *self.start.lock() = now;
        *self.soft.lock() = soft.map(|d| now + d);
        *self.hard.lock() = hard.map(|d| now + d);
    }

    #[must_use]
    pub fn snapshot(&self) -> (Instant, Option<Instant>, Option<Instant>) {
        (*self.start.lock(), *self.soft.lock(), *self.hard.lock())
    }

    #[must_use]
    pub fn hard_deadline(&self) -> Option<Instant> {
        *self.hard.lock()
    }
}

impl Default for SearchClock {
    fn default() -> Self {
        SearchClock::infinite()
    }
}

/// Caller-imposed bounds on one search.
pub struct SearchLimits {
    /// Depth cap, 0 for none.
    pub depth: u32,
    /// Global node budget across all workers, 0 for none.
    pub nodes: u64,
    pub clock: Arc<SearchClock>,
    pub stop: Arc<AtomicBool>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            depth: 0,
            nodes: 0,
            clock: Arc::new(SearchClock::infinite()),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Search configuration that persists across searches.
#[derive(Default, Clone)]
pub struct SearchSettings {
    /// Worker thread count; 0 and 1 both mean single-threaded.
    pub threads: usize,
    pub tablebase: Option<Arc<dyn Tablebase>>,
    pub info_callback: Option<SearchInfoCallback>,
}

/// Outcome of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found; `None` only when the position has no legal
    /// moves.
    pub best_move: Option<Move>,
    /// Expected reply, when the table has one.
    pub ponder_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/// Progress report emitted after each completed iteration.
#[derive(Debug, Clone)]
pub struct SearchIterationInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    /// Signed full moves to mate when `score` is a mate score.
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub time_ms: u64,
    pub pv: String,
}

pub type SearchInfoCallback = Arc<dyn Fn(&SearchIterationInfo) + Send + Sync>;
