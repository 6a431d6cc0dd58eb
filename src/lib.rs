pub mod board;
pub mod engine;
pub mod tt;
pub mod zobrist;

pub use board::{Board, Color, Move, MoveList, Piece, Square};
pub use engine::{Engine, GoParams};
pub use tt::TranspositionTable;
