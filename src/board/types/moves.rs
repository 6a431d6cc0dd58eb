//! Packed move representation and fixed-capacity move lists.
//!
//! A move fits in 16 bits: 6 bits source square, 6 bits destination
//! square, 4 bits flag. The flag distinguishes quiets, captures, double
//! pawn pushes, castling, en passant, and the four promotion pieces
//! (with and without capture).

use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use super::piece::Piece;
use super::square::Square;

/// Maximum pseudo-legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// Move flag nibble values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePawnPush = 1,
    KingCastle = 2,
    QueenCastle = 3,
    Capture = 4,
    EnPassant = 5,
    KnightPromo = 8,
    BishopPromo = 9,
    RookPromo = 10,
    QueenPromo = 11,
    KnightPromoCapture = 12,
    BishopPromoCapture = 13,
    RookPromoCapture = 14,
    QueenPromoCapture = 15,
}

impl MoveFlag {
    const PROMO_BIT: u16 = 8;
    const CAPTURE_BIT: u16 = 4;

    #[inline]
    #[must_use]
    pub const fn promotion_flag(piece: Piece, is_capture: bool) -> MoveFlag {
        match (piece, is_capture) {
            (Piece::Knight, false) => MoveFlag::KnightPromo,
            (Piece::Bishop, false) => MoveFlag::BishopPromo,
            (Piece::Rook, false) => MoveFlag::RookPromo,
            (Piece::Queen, false) => MoveFlag::QueenPromo,
            (Piece::Knight, true) => MoveFlag::KnightPromoCapture,
            (Piece::Bishop, true) => MoveFlag::BishopPromoCapture,
            (Piece::Rook, true) => MoveFlag::RookPromoCapture,
            (_, true) => MoveFlag::QueenPromoCapture,
            (_, false) => MoveFlag::QueenPromo,
        }
    }
}

/// A chess move packed into 16 bits.
///
/// The all-zero value doubles as the "null move" sentinel (a1-to-a1
/// quiet is not a legal chess move).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    #[must_use]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move((from.index() as u16) | ((to.index() as u16) << 6) | ((flag as u16) << 12))
    }

    #[inline]
    #[must_use]
    pub const fn from(self) -> Square {
        Square::from_index((self.0 & 0x3F) as usize)
    }

    #[inline]
    #[must_use]
    pub const fn to(self) -> Square {
        Square::from_index(((self.0 >> 6) & 0x3F) as usize)
    }

    #[inline]
    #[must_use]
    pub const fn flag_bits(self) -> u16 {
        self.0 >> 12
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw packed bits, for transposition table storage.
    #[inline]
    #[must_use]
    pub(crate) const fn as_u16(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub(crate) const fn from_u16(bits: u16) -> Self {
        Move(bits)
    }

    /// Captures, including en passant and promotion captures.
    #[inline]
    #[must_use]
    pub const fn is_capture(self) -> bool {
        self.flag_bits() & MoveFlag::CAPTURE_BIT != 0
    }

    #[inline]
    #[must_use]
    pub const fn is_promotion(self) -> bool {
        self.flag_bits() & MoveFlag::PROMO_BIT != 0
    }

    #[inline]
    #[must_use]
    pub const fn is_en_passant(self) -> bool {
        self.flag_bits() == MoveFlag::EnPassant as u16
    }

    #[inline]
    #[must_use]
    pub const fn is_double_pawn_push(self) -> bool {
        self.flag_bits() == MoveFlag::DoublePawnPush as u16
    }

    #[inline]
    #[must_use]
    pub const fn is_castle(self) -> bool {
        self.flag_bits() == MoveFlag::KingCastle as u16
            || self.flag_bits() == MoveFlag::QueenCastle as u16
    }

    #[inline]
    #[must_use]
    pub const fn is_kingside_castle(self) -> bool {
        self.flag_bits() == MoveFlag::KingCastle as u16
    }

    /// Captures and promotions; everything the quiescence search keeps.
    #[inline]
    #[must_use]
    pub const fn is_noisy(self) -> bool {
        self.flag_bits() & (MoveFlag::CAPTURE_BIT | MoveFlag::PROMO_BIT) != 0
    }

    /// Promotion piece, if this move is a promotion.
    #[inline]
    #[must_use]
    pub fn promotion(self) -> Option<Piece> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flag_bits() & 0x3 {
            0 => Piece::Knight,
            1 => Piece::Bishop,
            2 => Piece::Rook,
            _ => Piece::Queen,
        })
    }
}

impl fmt::Display for Move {
    /// Coordinate notation ("e2e4", "e7e8q"); the null move prints as "0000".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(piece) = self.promotion() {
            write!(f, "{}", piece.to_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, flag={})", self.flag_bits())
    }
}

/// Fixed-capacity list of moves, stack-allocated.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &[Move] {
        self.as_slice()
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, idx: usize) -> &Move {
        &self.as_slice()[idx]
    }
}

impl IndexMut<usize> for MoveList {
    fn index_mut(&mut self, idx: usize) -> &mut Move {
        &mut self.moves[..self.len][idx]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::square::Square;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn move_round_trips_fields() {
        let mv = Move::new(sq("e2"), sq("e4"), MoveFlag::DoublePawnPush);
        assert_eq!(mv.from(), sq("e2"));
        assert_eq!(mv.to(), sq("e4"));
        assert!(mv.is_double_pawn_push());
        assert!(!mv.is_capture());
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn promotion_flags() {
        let mv = Move::new(sq("e7"), sq("d8"), MoveFlag::QueenPromoCapture);
        assert!(mv.is_promotion());
        assert!(mv.is_capture());
        assert!(mv.is_noisy());
        assert_eq!(mv.promotion(), Some(Piece::Queen));
        assert_eq!(mv.to_string(), "e7d8q");

        let mv = Move::new(sq("a2"), sq("a1"), MoveFlag::KnightPromo);
        assert_eq!(mv.promotion(), Some(Piece::Knight));
        assert!(!mv.is_capture());
        assert_eq!(mv.to_string(), "a2a1n");
    }

    #[test]
    fn en_passant_is_capture() {
        let mv = Move::new(sq("e5"), sq("d6"), MoveFlag::EnPassant);
        assert!(mv.is_capture());
        assert!(mv.is_en_passant());
        assert_eq!(mv.promotion(), None);
    }

    #[test]
    fn null_move_sentinel() {
        assert!(Move::NULL.is_null());
        assert!(Move::default().is_null());
        assert_eq!(Move::NULL.to_string(), "0000");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn move_serializes_through_json() {
        let mv = Move::new(sq("e7"), sq("e8"), MoveFlag::QueenPromo);
        let json = serde_json::to_string(&mv).unwrap();
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mv);
        assert_eq!(back.to_string(), "e7e8q");
    }

    #[test]
    fn movelist_push_and_index() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let mv = Move::new(sq("g1"), sq("f3"), MoveFlag::Quiet);
        list.push(mv);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], mv);
        assert!(list.contains(mv));
        list.clear();
        assert!(list.is_empty());
    }
}
