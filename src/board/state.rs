//! Board state: piece placement, side to move, castling, hashes.

use crate::zobrist::ZOBRIST;

use super::types::{Bitboard, CastleSide, CastlingRights, Color, Piece, Square};

/// Everything needed to restore a position after `unmake_move`.
#[derive(Clone, Debug)]
pub struct UnmakeInfo {
    pub(crate) captured: Option<(Color, Piece)>,
    pub(crate) prev_en_passant: Option<Square>,
    pub(crate) prev_castling: CastlingRights,
    pub(crate) prev_hash: u64,
    pub(crate) prev_halfmove_clock: u32,
}

/// Restore record for `unmake_null_move`.
#[derive(Clone, Debug)]
pub struct NullMoveInfo {
    pub(crate) prev_en_passant: Option<Square>,
    pub(crate) prev_hash: u64,
    pub(crate) prev_halfmove_clock: u32,
}

/// A chess position.
///
/// Piece placement lives in 12 bitboards (`pieces[color][piece]`) with
/// cached per-color and total occupancy. The Zobrist hash is maintained
/// incrementally through every mutation; `hash_history` records the
/// hashes of all predecessor positions for repetition detection.
#[derive(Clone)]
pub struct Board {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) white_to_move: bool,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) castling: CastlingRights,
    pub(crate) hash: u64,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash_history: Vec<u64>,
}

impl Board {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, &piece) in back_rank.iter().enumerate() {
            board.set_piece(Square::from_index(file), Color::White, piece);
            board.set_piece(Square::from_index(8 + file), Color::White, Piece::Pawn);
            board.set_piece(Square::from_index(48 + file), Color::Black, Piece::Pawn);
            board.set_piece(Square::from_index(56 + file), Color::Black, piece);
        }
        board.castling = CastlingRights::standard();
        board.hash = board.calculate_hash();
        board
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            white_to_move: true,
            en_passant_target: None,
            castling: CastlingRights::none(),
            hash: 0,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash_history: Vec::with_capacity(256),
        }
    }

    #[inline]
    #[must_use]
    pub const fn side_to_move(&self) -> Color {
        if self.white_to_move {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    #[must_use]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub const fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub const fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    #[must_use]
    pub const fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    #[inline]
    #[must_use]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn pieces(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    #[inline]
    #[must_use]
    pub const fn occupied(&self) -> Bitboard {
        self.all_occupied
    }

    /// Piece and owner on a square, if any.
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        let color = if self.occupied[0].contains(sq) {
            Color::White
        } else if self.occupied[1].contains(sq) {
            Color::Black
        } else {
            return None;
        };
        for piece in Piece::ALL {
            if self.pieces[color.index()][piece.index()].contains(sq) {
                return Some((color, piece));
            }
        }
        unreachable!("occupancy and piece bitboards out of sync");
    }

    /// Piece type on a square ignoring ownership, for SEE and movegen
    /// hot paths where the owner is already known.
    #[inline]
    pub(crate) fn piece_type_at(&self, sq: Square) -> Option<Piece> {
        for piece in Piece::ALL {
            if (self.pieces[0][piece.index()] | self.pieces[1][piece.index()]).contains(sq) {
                return Some(piece);
            }
        }
        None
    }

    /// The king square. Every reachable position has exactly one king
    /// per side.
    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        debug_assert!(self.pieces(color, Piece::King).any());
        Square::from_index(self.pieces(color, Piece::King).lsb())
    }

    /// Place a piece, updating occupancy and hash.
    pub(crate) fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.occupied[color.index()] |= bb;
        self.all_occupied |= bb;
        self.hash ^= ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
    }

    /// Remove a piece known to be on the square, updating occupancy and hash.
    pub(crate) fn clear_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bb = Bitboard::from_square(sq);
        debug_assert!(self.pieces[color.index()][piece.index()].contains(sq));
        self.pieces[color.index()][piece.index()] ^= bb;
        self.occupied[color.index()] ^= bb;
        self.all_occupied ^= bb;
        self.hash ^= ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
    }

    /// XOR contribution of a set of castling rights.
    pub(crate) fn castling_hash(rights: CastlingRights) -> u64 {
        let mut hash = 0;
        for color in [Color::White, Color::Black] {
            for side in CastleSide::BOTH {
                if rights.has(color, side) {
                    hash ^= ZOBRIST.castling_keys[color.index()][side.index()];
                }
            }
        }
        hash
    }

    /// Full hash recomputation. Used after FEN parsing and in debug
    /// assertions; normal play updates the hash incrementally.
    #[must_use]
    pub(crate) fn calculate_hash(&self) -> u64 {
        let mut hash = 0;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                for sq in self.pieces(color, piece).iter() {
                    hash ^= ZOBRIST.piece_keys[color.index()][piece.index()][sq.index()];
                }
            }
        }
        if !self.white_to_move {
            hash ^= ZOBRIST.side_key;
        }
        hash ^= Self::castling_hash(self.castling);
        if let Some(ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_keys[ep.file() as usize];
        }
        hash
    }

    /// Whether the current position occurred at least `required` times
    /// before in the game history.
    ///
    /// Scans predecessor hashes backward in steps of two plies, bounded
    /// by the halfmove clock (no repetition can straddle an
    /// irreversible move). The search calls this with `required = 1` to
    /// treat a single recurrence as a draw, which prunes correctly even
    /// though the FIDE rule needs a third occurrence.
    #[must_use]
    pub fn is_repetition(&self, required: u32) -> bool {
        let mut count = 0;
        let n = self.hash_history.len();
        let max_back = (self.halfmove_clock as usize).min(n);
        let mut back = 2;
        while back <= max_back {
            if self.hash_history[n - back] == self.hash {
                count += 1;
                if count >= required {
                    return true;
                }
            }
            back += 2;
        }
        false
    }

    /// Fifty-move rule: 100 halfmoves without a capture or pawn move.
    #[inline]
    #[must_use]
    pub const fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Threefold repetition, the user-facing rule.
    #[must_use]
    pub fn is_threefold_repetition(&self) -> bool {
        self.is_repetition(2)
    }

    /// Dead positions: K vs K, K+minor vs K, and kings with any number
    /// of same-colored bishops.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let pawns = self.pieces(Color::White, Piece::Pawn) | self.pieces(Color::Black, Piece::Pawn);
        let majors = self.pieces(Color::White, Piece::Rook)
            | self.pieces(Color::Black, Piece::Rook)
            | self.pieces(Color::White, Piece::Queen)
            | self.pieces(Color::Black, Piece::Queen);
        if pawns.any() || majors.any() {
            return false;
        }
        let knights =
            self.pieces(Color::White, Piece::Knight) | self.pieces(Color::Black, Piece::Knight);
        let bishops =
            self.pieces(Color::White, Piece::Bishop) | self.pieces(Color::Black, Piece::Bishop);
        let minors = knights.count() + bishops.count();
        if minors <= 1 {
            return true;
        }
        // Any number of bishops all on one square color cannot mate.
        knights.is_empty()
            && ((bishops & Bitboard::DARK_SQUARES).is_empty()
                || (bishops & Bitboard::LIGHT_SQUARES).is_empty())
    }

    /// Any piece besides pawns and the king. Gates null-move pruning
    /// against zugzwang positions.
    #[must_use]
    pub(crate) fn has_non_pawn_material(&self, color: Color) -> bool {
        let c = color.index();
        (self.pieces[c][Piece::Knight.index()]
            | self.pieces[c][Piece::Bishop.index()]
            | self.pieces[c][Piece::Rook.index()]
            | self.pieces[c][Piece::Queen.index()])
        .any()
    }

    /// Whether `color`'s king is attacked.
    #[must_use]
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), !color)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Board {{")?;
        for rank in (0..8).rev() {
            write!(f, "  ")?;
            for file in 0..8 {
                let sq = Square::from_index(rank * 8 + file);
                let ch = match self.piece_at(sq) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  fen: {}", self.to_fen())?;
        write!(f, "}}")
    }
}
