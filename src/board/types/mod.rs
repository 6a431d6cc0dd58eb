//! Core value types: squares, pieces, bitboards, moves, castling rights.

pub mod bitboard;
pub mod castling;
pub mod moves;
pub mod piece;
pub mod square;

pub use bitboard::Bitboard;
pub use castling::{CastleSide, CastlingRights};
pub use moves::{Move, MoveFlag, MoveList, MAX_MOVES};
pub use piece::{Color, Piece};
pub use square::Square;
