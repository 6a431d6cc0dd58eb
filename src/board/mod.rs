//! Board representation and everything that operates directly on it:
//! attack tables, legal move generation, make/unmake, FEN, static
//! exchange evaluation, evaluation, and the search itself.

mod attack_tables;
mod error;
mod fen;
mod make_unmake;
mod masks;
mod movegen;
#[cfg(test)]
mod proptests;
mod see;
mod state;
mod types;

pub mod eval;
pub mod search;

pub use error::{FenError, MoveParseError, SquareError};
pub use fen::START_FEN;
pub use movegen::GenMode;
pub use state::{Board, NullMoveInfo, UnmakeInfo};
pub use types::{
    Bitboard, CastleSide, CastlingRights, Color, Move, MoveFlag, MoveList, Piece, Square,
    MAX_MOVES,
};
