//! Static evaluation: material plus piece-square tables.
//!
//! Deliberately compact. The search treats this function as an opaque
//! oracle returning a side-to-move-relative centipawn score, so it can
//! be swapped out without touching the search.

use super::types::{Color, Piece};
use super::Board;

const MATERIAL: [i32; 6] = [100, 320, 330, 500, 900, 0];

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-20,-20, 10, 10,  5,
     5, -5,-10,  0,  0,-10, -5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5,  5, 10, 25, 25, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 50, 50, 50, 50, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -10,  5,  5,  5,  5,  5,  0,-10,
     0,  0,  5,  5,  5,  5,  0, -5,
    -5,  0,  5,  5,  5,  5,  0, -5,
   -10,  0,  5,  5,  5,  5,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG_PST: [i32; 64] = [
    20, 30, 10,  0,  0, 10, 30, 20,
    20, 20,  0,  0,  0,  0, 20, 20,
   -10,-20,-20,-20,-20,-20,-20,-10,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
];

#[rustfmt::skip]
const KING_EG_PST: [i32; 64] = [
   -50,-30,-30,-30,-30,-30,-30,-50,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -50,-40,-30,-20,-10,-30,-40,-50,
];

/// Phase weights per piece type; 24 = all minors and majors on board.
const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];
const MAX_PHASE: i32 = 24;

/// Side-to-move-relative static evaluation in centipawns.
#[must_use]
pub fn evaluate(board: &Board) -> i32 {
    let mut phase = 0;
    for color in [Color::White, Color::Black] {
        for piece in Piece::ALL {
            phase += PHASE_WEIGHTS[piece.index()] * board.pieces(color, piece).count() as i32;
        }
    }
    let mg_weight = phase.min(MAX_PHASE);
    let eg_weight = MAX_PHASE - mg_weight;

    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let mut side = 0;
        for piece in Piece::ALL {
            let pst: &[i32; 64] = match piece {
                Piece::Pawn => &PAWN_PST,
                Piece::Knight => &KNIGHT_PST,
                Piece::Bishop => &BISHOP_PST,
                Piece::Rook => &ROOK_PST,
                Piece::Queen => &QUEEN_PST,
                Piece::King => &KING_MG_PST,
            };
            for sq in board.pieces(color, piece).iter() {
                // Tables read from white's side; mirror for black.
                let idx = if color == Color::White {
                    sq.index()
                } else {
                    sq.index() ^ 56
                };
                if piece == Piece::King {
                    // Only the king tables are tapered by phase.
                    side += (KING_MG_PST[idx] * mg_weight + KING_EG_PST[idx] * eg_weight)
                        / MAX_PHASE;
                } else {
                    side += MATERIAL[piece.index()] + pst[idx];
                }
            }
        }
        score += if color == Color::White { side } else { -side };
    }

    if board.side_to_move() == Color::White {
        score
    } else {
        -score
    }
}
