//! Engine controller: the seam a protocol front end drives.
//!
//! Owns the game position and the transposition table across moves.
//! Searches run either on the calling thread (`go`) or a background
//! thread (`go_async`), with `stop` and `ponderhit` usable from the
//! outside while one runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;

use crate::board::search::{
    run_search, SearchClock, SearchInfoCallback, SearchLimits, SearchResult, SearchSettings,
    Tablebase,
};
use crate::board::{Board, Color, FenError, MoveParseError};
use crate::tt::TranspositionTable;

/// Why a position could not be set.
#[derive(Debug)]
pub enum PositionError {
    Fen(FenError),
    Move(MoveParseError),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::Fen(err) => write!(f, "bad position: {err}"),
            PositionError::Move(err) => write!(f, "bad move in move list: {err}"),
        }
    }
}

impl std::error::Error for PositionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PositionError::Fen(err) => Some(err),
            PositionError::Move(err) => Some(err),
        }
    }
}

impl From<FenError> for PositionError {
    fn from(err: FenError) -> Self {
        PositionError::Fen(err)
    }
}

impl From<MoveParseError> for PositionError {
    fn from(err: MoveParseError) -> Self {
        PositionError::Move(err)
    }
}

/// Limits for one `go` command. Unset fields mean unlimited.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime: Option<u64>,
    pub nodes: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub infinite: bool,
    pub ponder: bool,
}

impl GoParams {
    #[must_use]
    pub fn depth(depth: u32) -> Self {
        GoParams {
            depth: Some(depth),
            ..GoParams::default()
        }
    }

    #[must_use]
    pub fn movetime(ms: u64) -> Self {
        GoParams {
            movetime: Some(ms),
            ..GoParams::default()
        }
    }

    #[must_use]
    pub fn infinite() -> Self {
        GoParams {
            infinite: true,
            ..GoParams::default()
        }
    }

    #[must_use]
    pub fn with_nodes(mut self, nodes: u64) -> Self {
        self.nodes = Some(nodes);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, wtime: u64, btime: u64, winc: u64, binc: u64) -> Self {
        self.wtime = Some(wtime);
        self.btime = Some(btime);
        self.winc = Some(winc);
        self.binc = Some(binc);
        self
    }

    #[must_use]
    pub fn with_movestogo(mut self, movestogo: u32) -> Self {
        self.movestogo = Some(movestogo);
        self
    }

    #[must_use]
    pub fn pondering(mut self) -> Self {
        self.ponder = true;
        self
    }
}

type TimeBudget = (Option<Duration>, Option<Duration>);

/// Soft and hard budgets from the clock state. Soft is when iterative
/// deepening stops starting new iterations, hard is when the search
/// aborts mid-node.
fn allocate_time(params: &GoParams, side: Color) -> TimeBudget {
    if let Some(ms) = params.movetime {
        let fixed = Duration::from_millis(ms);
        return (Some(fixed), Some(fixed));
    }
    let (time, inc) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    let Some(time) = time else {
        return (None, None);
    };
    let inc = inc.unwrap_or(0);
    let moves_to_go = u64::from(params.movestogo.unwrap_or(30)).max(1);

    let base = time / moves_to_go + inc * 3 / 4;
    // Never burn the whole clock on one move.
    let hard = (base * 3).min(time.saturating_sub(50)).max(1);
    let soft = base.min(hard);
    (
        Some(Duration::from_millis(soft)),
        Some(Duration::from_millis(hard)),
    )
}

pub struct Engine {
    board: Board,
    tt: Arc<TranspositionTable>,
    settings: SearchSettings,
    stop: Arc<AtomicBool>,
    clock: Arc<SearchClock>,
    /// Time budget parked during a ponder search, applied on
    /// `ponderhit`.
    pending_budget: Arc<Mutex<Option<TimeBudget>>>,
    worker: Option<JoinHandle<SearchResult>>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Engine::with_tt_size(TranspositionTable::DEFAULT_MB)
    }

    #[must_use]
    pub fn with_tt_size(size_mb: usize) -> Self {
        Engine {
            board: Board::new(),
            tt: Arc::new(TranspositionTable::new(size_mb)),
            settings: SearchSettings::default(),
            stop: Arc::new(AtomicBool::new(false)),
            clock: Arc::new(SearchClock::infinite()),
            pending_budget: Arc::new(Mutex::new(None)),
            worker: None,
        }
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.settings.threads = threads;
    }

    pub fn set_tablebase(&mut self, tablebase: Arc<dyn Tablebase>) {
        self.settings.tablebase = Some(tablebase);
    }

    pub fn set_info_callback(&mut self, callback: SearchInfoCallback) {
        self.settings.info_callback = Some(callback);
    }

    #[must_use]
    pub fn position(&self) -> &Board {
        &self.board
    }

    /// Forget everything from the previous game.
    pub fn new_game(&mut self) {
        self.abort_running();
        self.tt.clear();
        self.board = Board::new();
        debug!("new game");
    }

    /// Set the position from a FEN and a list of moves played from it.
    pub fn set_position(&mut self, fen: &str, moves: &[&str]) -> Result<(), PositionError> {
        self.abort_running();
        let mut board: Board = fen.parse()?;
        for notation in moves {
            let mv = board.parse_move(notation)?;
            board.make_move(mv);
        }
        self.board = board;
        Ok(())
    }

    /// Search the current position on the calling thread and return
    /// the single final result.
    pub fn go(&mut self, params: &GoParams) -> SearchResult {
        self.abort_running();
        let limits = self.prepare(params);
        let result = run_search(&self.board, &self.tt, &limits, &self.settings);
        info!(
            "bestmove {} score {} depth {}",
            result
                .best_move
                .map_or_else(|| "(none)".to_string(), |mv| mv.to_string()),
            result.score,
            result.depth
        );
        result
    }

    /// Start a search in the background. Collect it with `stop` or
    /// `wait`.
    pub fn go_async(&mut self, params: &GoParams) {
        self.abort_running();
        let limits = self.prepare(params);
        let board = self.board.clone();
        let tt = Arc::clone(&self.tt);
        let settings = self.settings.clone();
        self.worker = Some(
            std::thread::Builder::new()
                .name("search-main".to_string())
                .spawn(move || run_search(&board, &tt, &limits, &settings))
                .expect("failed to spawn search thread"),
        );
    }

    /// Stop the running search, if any, and return its result.
    pub fn stop(&mut self) -> Option<SearchResult> {
        self.stop.store(true, Ordering::Relaxed);
        self.wait()
    }

    /// Wait for the background search to finish on its own limits.
    pub fn wait(&mut self) -> Option<SearchResult> {
        self.worker.take().and_then(|handle| handle.join().ok())
    }

    /// The pondered-on move was played: start the clock that `go`
    /// held back.
    pub fn ponderhit(&self) {
        if let Some((soft, hard)) = self.pending_budget.lock().take() {
            self.clock.restart(soft, hard);
            debug!("ponderhit, clock started");
        }
    }

    fn prepare(&mut self, params: &GoParams) -> SearchLimits {
        self.stop.store(false, Ordering::Relaxed);
        let budget = allocate_time(params, self.board.side_to_move());
        if params.ponder || params.infinite {
            self.clock.restart(None, None);
            *self.pending_budget.lock() = if params.ponder { Some(budget) } else { None };
        } else {
            self.clock.restart(budget.0, budget.1);
            *self.pending_budget.lock() = None;
        }
        SearchLimits {
            depth: params.depth.unwrap_or(0),
            nodes: params.nodes.unwrap_or(0),
            clock: Arc::clone(&self.clock),
            stop: Arc::clone(&self.stop),
        }
    }

    fn abort_running(&mut self) {
        if self.worker.is_some() {
            self.stop.store(true, Ordering::Relaxed);
            let _ = self.wait();
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.abort_running();
    }
}
