//! Making and unmaking moves.
//!
//! `make_move` mutates the board in place and returns an `UnmakeInfo`
//! that `unmake_move` uses to restore the previous position exactly,
//! hash included. The Zobrist hash is updated incrementally through
//! `set_piece`/`clear_piece` plus explicit castling, en passant and
//! side-key deltas.

use super::error::MoveParseError;
use super::types::{CastleSide, Color, Move, Piece, Square};
use super::{Board, NullMoveInfo, UnmakeInfo};
use crate::board::attack_tables::pawn_attacks;
use crate::zobrist::ZOBRIST;

impl Board {
    /// Apply a legal move.
    pub fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let us = self.side_to_move();
        let them = !us;
        let from = mv.from();
        let to = mv.to();

        self.hash_history.push(self.hash);
        let mut info = UnmakeInfo {
            captured: None,
            prev_en_passant: self.en_passant_target,
            prev_castling: self.castling,
            prev_hash: self.hash,
            prev_halfmove_clock: self.halfmove_clock,
        };

        if let Some(ep) = self.en_passant_target.take() {
            self.hash ^= ZOBRIST.en_passant_keys[ep.file() as usize];
        }
        self.halfmove_clock += 1;

        let piece = match self.piece_type_at(from) {
            Some(piece) => piece,
            None => unreachable!("make_move on empty source square"),
        };

        if mv.is_capture() {
            self.halfmove_clock = 0;
            if mv.is_en_passant() {
                let cap_sq = Square::from_index((to.index() as i8 - us.forward()) as usize);
                self.clear_piece(cap_sq, them, Piece::Pawn);
                info.captured = Some((them, Piece::Pawn));
            } else {
                // to is occupied by the victim; castling never carries
                // the capture flag.
                let victim = match self.piece_type_at(to) {
                    Some(victim) => victim,
                    None => unreachable!("capture flag without a victim"),
                };
                self.clear_piece(to, them, victim);
                info.captured = Some((them, victim));
            }
        }

        if mv.is_castle() {
            let side = if mv.is_kingside_castle() {
                CastleSide::King
            } else {
                CastleSide::Queen
            };
            let back = from.rank();
            let rook_from = Square::from_index(back as usize * 8 + self.castling.rook_file(us, side) as usize);
            let rook_to = Square::from_index(back as usize * 8 + side.rook_dest_file() as usize);
            // Remove both pieces before placing either; with
            // non-standard rook files the squares may overlap.
            self.clear_piece(from, us, Piece::King);
            self.clear_piece(rook_from, us, Piece::Rook);
            self.set_piece(to, us, Piece::King);
            self.set_piece(rook_to, us, Piece::Rook);
        } else if let Some(promo) = mv.promotion() {
            self.halfmove_clock = 0;
            self.clear_piece(from, us, Piece::Pawn);
            self.set_piece(to, us, promo);
        } else {
            if piece == Piece::Pawn {
                self.halfmove_clock = 0;
            }
            self.clear_piece(from, us, piece);
            self.set_piece(to, us, piece);
        }

        if mv.is_double_pawn_push() {
            let ep = Square::from_index((from.index() as i8 + us.forward()) as usize);
            // Record the target only when an enemy pawn can take.
            if (pawn_attacks(us, ep) & self.pieces(them, Piece::Pawn)).any() {
                self.en_passant_target = Some(ep);
                self.hash ^= ZOBRIST.en_passant_keys[ep.file() as usize];
            }
        }

        self.update_castling_rights(us, piece, from, to, mv);
        if self.castling != info.prev_castling {
            self.hash ^=
                Self::castling_hash(info.prev_castling) ^ Self::castling_hash(self.castling);
        }

        self.white_to_move = !self.white_to_move;
        self.hash ^= ZOBRIST.side_key;
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        info
    }

    /// Undo the most recent `make_move`.
    pub fn unmake_move(&mut self, mv: Move, info: &UnmakeInfo) {
        let popped = self.hash_history.pop();
        debug_assert_eq!(popped, Some(info.prev_hash));

        self.white_to_move = !self.white_to_move;
        let us = self.side_to_move();
        let from = mv.from();
        let to = mv.to();
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        if mv.is_castle() {
            let side = if mv.is_kingside_castle() {
                CastleSide::King
            } else {
                CastleSide::Queen
            };
            let back = from.rank();
            let rook_from = Square::from_index(
                back as usize * 8 + info.prev_castling.rook_file(us, side) as usize,
            );
            let rook_to = Square::from_index(back as usize * 8 + side.rook_dest_file() as usize);
            self.clear_piece(to, us, Piece::King);
            self.clear_piece(rook_to, us, Piece::Rook);
            self.set_piece(from, us, Piece::King);
            self.set_piece(rook_from, us, Piece::Rook);
        } else if mv.is_promotion() {
            let promo = match mv.promotion() {
                Some(promo) => promo,
                None => unreachable!(),
            };
            self.clear_piece(to, us, promo);
            self.set_piece(from, us, Piece::Pawn);
        } else {
            let piece = match self.piece_type_at(to) {
                Some(piece) => piece,
                None => unreachable!("unmake_move with empty destination"),
            };
            self.clear_piece(to, us, piece);
            self.set_piece(from, us, piece);
        }

        if let Some((color, victim)) = info.captured {
            let cap_sq = if mv.is_en_passant() {
                Square::from_index((to.index() as i8 - us.forward()) as usize)
            } else {
                to
            };
            self.set_piece(cap_sq, color, victim);
        }

        self.en_passant_target = info.prev_en_passant;
        self.castling = info.prev_castling;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.hash = info.prev_hash;
    }

    /// Pass the move without moving, for null-move pruning.
    pub fn make_null_move(&mut self) -> NullMoveInfo {
        self.hash_history.push(self.hash);
        let info = NullMoveInfo {
            prev_en_passant: self.en_passant_target,
            prev_hash: self.hash,
            prev_halfmove_clock: self.halfmove_clock,
        };
        if let Some(ep) = self.en_passant_target.take() {
            self.hash ^= ZOBRIST.en_passant_keys[ep.file() as usize];
        }
        self.halfmove_clock += 1;
        self.white_to_move = !self.white_to_move;
        self.hash ^= ZOBRIST.side_key;
        info
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        let popped = self.hash_history.pop();
        debug_assert_eq!(popped, Some(info.prev_hash));
        self.white_to_move = !self.white_to_move;
        self.en_passant_target = info.prev_en_passant;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.hash = info.prev_hash;
    }

    fn update_castling_rights(&mut self, us: Color, piece: Piece, from: Square, to: Square, mv: Move) {
        if piece == Piece::King {
            self.castling.revoke_all(us);
        } else if piece == Piece::Rook && self.castling.any_for(us) {
            let back_rank = if us == Color::White { 0 } else { 7 };
            if from.rank() == back_rank {
                for side in CastleSide::BOTH {
                    if self.castling.has(us, side) && self.castling.rook_file(us, side) == from.file() {
                        self.castling.revoke(us, side);
                    }
                }
            }
        }
        // Capturing a castling rook on its home square kills that right.
        if mv.is_capture() && !mv.is_en_passant() {
            let them = !us;
            let their_back = if them == Color::White { 0 } else { 7 };
            if to.rank() == their_back && self.castling.any_for(them) {
                for side in CastleSide::BOTH {
                    if self.castling.has(them, side)
                        && self.castling.rook_file(them, side) == to.file()
                    {
                        self.castling.revoke(them, side);
                    }
                }
            }
        }
    }

    /// Parse a move in coordinate notation and match it against the
    /// legal moves of this position. Castling is accepted both as the
    /// king's destination square ("e1g1") and as king-takes-rook.
    pub fn parse_move(&self, notation: &str) -> Result<Move, MoveParseError> {
        let len = notation.len();
        if !(4..=5).contains(&len) {
            return Err(MoveParseError::InvalidLength { len });
        }
        let from: Square = notation[..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            })?;
        let to: Square = notation[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            })?;
        let promo = match notation.as_bytes().get(4) {
            None => None,
            Some(&b) => {
                let piece = Piece::from_char(b as char)
                    .filter(|p| matches!(p, Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen))
                    .ok_or(MoveParseError::InvalidPromotion { ch: b as char })?;
                Some(piece)
            }
        };

        let us = self.side_to_move();
        for mv in self.generate_moves().iter().copied() {
            if mv.from() != from || mv.promotion() != promo {
                continue;
            }
            if mv.to() == to {
                return Ok(mv);
            }
            if mv.is_castle() {
                let side = if mv.is_kingside_castle() {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                let rook_sq = Square::from_index(
                    from.rank() as usize * 8 + self.castling.rook_file(us, side) as usize,
                );
                if rook_sq == to {
                    return Ok(mv);
                }
            }
        }
        Err(MoveParseError::IllegalMove {
            notation: notation.to_string(),
        })
    }
}
