//! FEN parsing and serialization.
//!
//! Accepts standard FEN, X-FEN castling letters (KQkq) and Shredder
//! FEN file letters (A-H / a-h) for positions with non-standard rook
//! files. Parsing validates the position; a malformed or unreachable
//! FEN returns `FenError` and never yields a partially-built board.

use std::fmt::Write as _;
use std::str::FromStr;

use super::attack_tables::pawn_attacks;
use super::error::FenError;
use super::types::{Bitboard, CastleSide, CastlingRights, Color, Piece, Square};
use super::Board;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parse a position from FEN.
    pub fn try_from_fen(fen: &str) -> Result<Self, FenError> {
        let mut board = Board::empty();
        let fields: Vec<&str> = fen.split_whitespace().collect();

        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { found: ranks.len() });
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                } else {
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let piece = Piece::from_char(ch).ok_or(FenError::InvalidPiece { ch })?;
                    if file >= 8 {
                        return Err(FenError::WrongFileCount { rank });
                    }
                    board.set_piece(Square::from_index(rank * 8 + file), color, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::WrongFileCount { rank });
            }
        }

        match fields[1] {
            "w" => board.white_to_move = true,
            "b" => board.white_to_move = false,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        }

        parse_castling(&mut board, fields[2])?;

        if fields[3] != "-" {
            let ep: Square = fields[3].parse().map_err(|_| FenError::InvalidEnPassant {
                found: fields[3].to_string(),
            })?;
            let expected_rank = if board.white_to_move { 5 } else { 2 };
            if ep.rank() != expected_rank {
                return Err(FenError::InvalidEnPassant {
                    found: fields[3].to_string(),
                });
            }
            // Keep the target only when a capture is actually possible,
            // so equal positions always hash equally.
            let stm = board.side_to_move();
            let capturers = pawn_attacks(!stm, ep) & board.pieces(stm, Piece::Pawn);
            if capturers.any() {
                board.en_passant_target = Some(ep);
            }
        }

        if fields.len() >= 5 {
            board.halfmove_clock = fields[4].parse().map_err(|_| FenError::InvalidCounter {
                found: fields[4].to_string(),
            })?;
        }
        if fields.len() >= 6 {
            board.fullmove_number = fields[5].parse().map_err(|_| FenError::InvalidCounter {
                found: fields[5].to_string(),
            })?;
        }

        validate_position(&board)?;
        board.hash = board.calculate_hash();
        Ok(board)
    }

    /// Serialize to FEN. Non-standard castling rook files print as
    /// Shredder file letters.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let sq = Square::from_index(rank * 8 + file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            let _ = write!(fen, "{empty}");
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                let _ = write!(fen, "{empty}");
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        let _ = write!(
            fen,
            " {} {} {} {} {}",
            if self.white_to_move { 'w' } else { 'b' },
            self.castling,
            self.en_passant_target
                .map_or_else(|| "-".to_string(), |sq| sq.to_string()),
            self.halfmove_clock,
            self.fullmove_number
        );
        fen
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::try_from_fen(s)
    }
}

fn parse_castling(board: &mut Board, field: &str) -> Result<(), FenError> {
    if field == "-" {
        return Ok(());
    }
    for ch in field.chars() {
        let color = if ch.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let back_rank = if color == Color::White { 0 } else { 7 };
        let king_bb = board.pieces(color, Piece::King);
        if king_bb.count() != 1 {
            return Err(FenError::IllegalPosition {
                reason: "castling rights without a unique king",
            });
        }
        let king = board.king_square(color);
        if king.rank() != back_rank {
            return Err(FenError::MissingCastlingRook { ch });
        }
        let rooks = board.pieces(color, Piece::Rook);
        let rook_on = |file: u8| {
            Square::new(back_rank, file).is_some_and(|sq| rooks.contains(sq))
        };

        let (side, rook_file) = match ch.to_ascii_uppercase() {
            'K' => {
                // X-FEN: the outermost rook kingside of the king.
                let file = ((king.file() + 1)..8)
                    .rev()
                    .find(|&f| rook_on(f))
                    .ok_or(FenError::MissingCastlingRook { ch })?;
                (CastleSide::King, file)
            }
            'Q' => {
                let file = (0..king.file())
                    .find(|&f| rook_on(f))
                    .ok_or(FenError::MissingCastlingRook { ch })?;
                (CastleSide::Queen, file)
            }
            file_ch @ 'A'..='H' => {
                let file = file_ch as u8 - b'A';
                if !rook_on(file) {
                    return Err(FenError::MissingCastlingRook { ch });
                }
                let side = if file > king.file() {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                (side, file)
            }
            _ => return Err(FenError::InvalidCastling { ch }),
        };
        board.castling.grant(color, side, rook_file);
    }
    Ok(())
}

fn validate_position(board: &Board) -> Result<(), FenError> {
    for color in [Color::White, Color::Black] {
        if board.pieces(color, Piece::King).count() != 1 {
            return Err(FenError::IllegalPosition {
                reason: "each side must have exactly one king",
            });
        }
    }
    let pawns = board.pieces(Color::White, Piece::Pawn) | board.pieces(Color::Black, Piece::Pawn);
    if (pawns & (Bitboard::RANK_1 | Bitboard::RANK_8)).any() {
        return Err(FenError::IllegalPosition {
            reason: "pawn on a back rank",
        });
    }
    let stm = board.side_to_move();
    if board.in_check(!stm) {
        return Err(FenError::IllegalPosition {
            reason: "side not to move is in check",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_round_trips() {
        let board = Board::try_from_fen(START_FEN).unwrap();
        assert_eq!(board.to_fen(), START_FEN);
        assert_eq!(board.hash, Board::new().hash);
    }

    #[test]
    fn kiwipete_round_trips() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::try_from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn black_to_move_and_counters() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let board = Board::try_from_fen(fen).unwrap();
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
    }

    #[test]
    fn en_passant_kept_only_when_capturable() {
        // Black pawn on d4 can take on e3.
        let fen = "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2";
        let board = Board::try_from_fen(fen).unwrap();
        assert_eq!(board.en_passant_target(), Some("e3".parse().unwrap()));

        // No black pawn adjacent to e4: the target is dropped.
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let board = Board::try_from_fen(fen).unwrap();
        assert_eq!(board.en_passant_target(), None);
    }

    #[test]
    fn shredder_castling_letters() {
        // Rooks on b1/g1 with the king on d1.
        let fen = "1r1k2r1/8/8/8/8/8/8/1R1K2R1 w GBgb - 0 1";
        let board = Board::try_from_fen(fen).unwrap();
        let rights = board.castling_rights();
        assert_eq!(rights.rook_file(Color::White, CastleSide::King), 6);
        assert_eq!(rights.rook_file(Color::White, CastleSide::Queen), 1);
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn malformed_fens_are_rejected() {
        assert!(matches!(
            Board::try_from_fen("8/8/8/8 w"),
            Err(FenError::TooFewFields { found: 2 })
        ));
        assert!(matches!(
            Board::try_from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::WrongRankCount { found: 7 })
        ));
        assert!(matches!(
            Board::try_from_fen("9/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::WrongRankCount { .. }) | Err(FenError::WrongFileCount { .. })
        ));
        assert!(matches!(
            Board::try_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Board::try_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(FenError::InvalidCounter { .. })
        ));
        // Missing black king.
        assert!(matches!(
            Board::try_from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::IllegalPosition { .. })
        ));
        // Pawn on the eighth rank.
        assert!(matches!(
            Board::try_from_fen("P3k3/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::IllegalPosition { .. })
        ));
        // 'K' right with the h-side rook missing.
        assert!(matches!(
            Board::try_from_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1"),
            Err(FenError::MissingCastlingRook { .. })
        ));
        // Side not to move already in check.
        assert!(matches!(
            Board::try_from_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1"),
            Ok(_)
        ));
        assert!(matches!(
            Board::try_from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1"),
            Err(FenError::IllegalPosition { .. })
        ));
    }
}
