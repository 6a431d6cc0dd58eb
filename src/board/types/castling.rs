//! Castling rights, including non-standard rook files (Chess960).

use std::fmt;

use super::piece::Color;

/// Castling wing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            CastleSide::King => 0,
            CastleSide::Queen => 1,
        }
    }

    /// King destination file after castling (g-file or c-file).
    #[inline]
    #[must_use]
    pub(crate) const fn king_dest_file(self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    /// Rook destination file after castling (f-file or d-file).
    #[inline]
    #[must_use]
    pub(crate) const fn rook_dest_file(self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }
}

/// Castling availability plus the starting file of each castling rook.
///
/// Rook files are tracked per color and wing so that positions with
/// non-standard rook placement (Chess960, Shredder FEN) castle
/// correctly. In standard chess they are always h (7) and a (0).
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastlingRights {
    rights: u8,
    rook_files: [[u8; 2]; 2],
}

impl CastlingRights {
    const WHITE_KING: u8 = 1;
    const WHITE_QUEEN: u8 = 2;
    const BLACK_KING: u8 = 4;
    const BLACK_QUEEN: u8 = 8;

    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        CastlingRights {
            rights: 0,
            rook_files: [[7, 0], [7, 0]],
        }
    }

    /// All four rights with standard rook files.
    #[inline]
    #[must_use]
    pub const fn standard() -> Self {
        CastlingRights {
            rights: 0xF,
            rook_files: [[7, 0], [7, 0]],
        }
    }

    #[inline]
    const fn bit(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::King) => Self::WHITE_KING,
            (Color::White, CastleSide::Queen) => Self::WHITE_QUEEN,
            (Color::Black, CastleSide::King) => Self::BLACK_KING,
            (Color::Black, CastleSide::Queen) => Self::BLACK_QUEEN,
        }
    }

    #[inline]
    #[must_use]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.rights & Self::bit(color, side) != 0
    }

    #[inline]
    #[must_use]
    pub const fn any_for(self, color: Color) -> bool {
        let mask = match color {
            Color::White => Self::WHITE_KING | Self::WHITE_QUEEN,
            Color::Black => Self::BLACK_KING | Self::BLACK_QUEEN,
        };
        self.rights & mask != 0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.rights == 0
    }

    pub fn grant(&mut self, color: Color, side: CastleSide, rook_file: u8) {
        debug_assert!(rook_file < 8);
        self.rights |= Self::bit(color, side);
        self.rook_files[color.index()][side.index()] = rook_file;
    }

    #[inline]
    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        self.rights &= !Self::bit(color, side);
    }

    #[inline]
    pub fn revoke_all(&mut self, color: Color) {
        self.revoke(color, CastleSide::King);
        self.revoke(color, CastleSide::Queen);
    }

    /// Starting file of the castling rook for this color and wing.
    #[inline]
    #[must_use]
    pub const fn rook_file(self, color: Color, side: CastleSide) -> u8 {
        self.rook_files[color.index()][side.index()]
    }

}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for CastlingRights {
    /// FEN castling field. Standard rook files print as KQkq; a rook
    /// on a non-standard file prints as its Shredder FEN file letter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for color in [Color::White, Color::Black] {
            for side in CastleSide::BOTH {
                if !self.has(color, side) {
                    continue;
                }
                let file = self.rook_file(color, side);
                let standard = match side {
                    CastleSide::King => 7,
                    CastleSide::Queen => 0,
                };
                let c = if file == standard {
                    match side {
                        CastleSide::King => 'K',
                        CastleSide::Queen => 'Q',
                    }
                } else {
                    (b'A' + file) as char
                };
                let c = if color == Color::White {
                    c
                } else {
                    c.to_ascii_lowercase()
                };
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastlingRights({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rights_display() {
        assert_eq!(CastlingRights::standard().to_string(), "KQkq");
        assert_eq!(CastlingRights::none().to_string(), "-");
    }

    #[test]
    fn revoke_clears_single_right() {
        let mut rights = CastlingRights::standard();
        rights.revoke(Color::White, CastleSide::Queen);
        assert!(rights.has(Color::White, CastleSide::King));
        assert!(!rights.has(Color::White, CastleSide::Queen));
        assert_eq!(rights.to_string(), "Kkq");

        rights.revoke_all(Color::Black);
        assert!(!rights.any_for(Color::Black));
        assert!(rights.any_for(Color::White));
    }

    #[test]
    fn nonstandard_rook_file_uses_shredder_letter() {
        let mut rights = CastlingRights::none();
        rights.grant(Color::White, CastleSide::King, 6);
        rights.grant(Color::Black, CastleSide::Queen, 1);
        assert_eq!(rights.rook_file(Color::White, CastleSide::King), 6);
        assert_eq!(rights.to_string(), "Gb");
    }

    #[test]
    fn castle_destination_files() {
        assert_eq!(CastleSide::King.king_dest_file(), 6);
        assert_eq!(CastleSide::King.rook_dest_file(), 5);
        assert_eq!(CastleSide::Queen.king_dest_file(), 2);
        assert_eq!(CastleSide::Queen.rook_dest_file(), 3);
    }
}
