//! Search constants shared across the search pipeline.

/// Deepest ply the search will ever reach. The per-ply stack and the
/// mate-score window are both sized from this.
pub const MAX_PLY: usize = 128;

/// Mate at the root. A mate found at ply `n` scores `MATE - n`, so
/// shorter mates always win comparisons.
pub const MATE: i32 = 30_000;

/// Scores at or beyond this magnitude are mate scores and carry a ply
/// distance that must be normalized when stored in the table.
pub const MATE_IN_MAX: i32 = MATE - MAX_PLY as i32;

/// Window bound strictly outside every legal score.
pub const INFINITE: i32 = 31_000;

pub const DRAW: i32 = 0;

/// Stop-flag and clock poll interval, in nodes.
pub const STOP_POLL_INTERVAL: u64 = 1024;

/// Null-move pruning base reduction; depth adds more.
pub const NULL_MOVE_REDUCTION: i32 = 3;

/// Razoring margin per unit of depth.
pub const RAZOR_MARGIN: i32 = 240;

/// Reverse futility margin per unit of depth.
pub const RFP_MARGIN: i32 = 80;
pub const RFP_MAX_DEPTH: i32 = 8;

/// Singular extension gate: minimum depth and margin per unit of depth.
pub const SINGULAR_MIN_DEPTH: i32 = 8;
pub const SINGULAR_MARGIN: i32 = 2;

/// SEE pruning threshold per unit of depth for bad captures.
pub const SEE_CAPTURE_MARGIN: i32 = -90;
pub const SEE_PRUNE_MAX_DEPTH: i32 = 8;

/// Aspiration windows start at this depth with this half-width.
pub const ASPIRATION_MIN_DEPTH: u32 = 4;
pub const ASPIRATION_DELTA: i32 = 25;

/// History scores saturate at this magnitude.
pub const HISTORY_MAX: i32 = 16_384;
