//! Property-based tests over random legal game walks.

use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Board, Move, UnmakeInfo};

fn seed_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

fn walk_length_strategy() -> impl Strategy<Value = usize> {
    1..=40usize
}

/// Play `len` random legal moves from the starting position.
fn random_walk(seed: u64, len: usize) -> (Board, Vec<(Move, UnmakeInfo)>) {
    let mut board = Board::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut history = Vec::new();

    for _ in 0..len {
        let moves = board.generate_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        let info = board.make_move(mv);
        history.push((mv, info));
    }
    (board, history)
}

proptest! {
    /// Unmaking every move restores the position exactly.
    #[test]
    fn make_unmake_restores_state(seed in seed_strategy(), len in walk_length_strategy()) {
        let start = Board::new();
        let (mut board, mut history) = random_walk(seed, len);

        while let Some((mv, info)) = history.pop() {
            board.unmake_move(mv, &info);
        }

        prop_assert_eq!(board.hash(), start.hash());
        prop_assert_eq!(board.to_fen(), start.to_fen());
    }

    /// The incrementally maintained hash always matches a recompute
    /// from scratch.
    #[test]
    fn incremental_hash_matches_recompute(seed in seed_strategy(), len in walk_length_strategy()) {
        let (board, _) = random_walk(seed, len);
        prop_assert_eq!(board.hash(), board.calculate_hash());
    }

    /// FEN round-trips through parse and serialize.
    #[test]
    fn fen_roundtrip(seed in seed_strategy(), len in walk_length_strategy()) {
        let (board, _) = random_walk(seed, len);
        let fen = board.to_fen();
        let restored: Board = fen.parse().unwrap();
        prop_assert_eq!(restored.to_fen(), fen);
        prop_assert_eq!(restored.hash(), board.hash());
    }

    /// Generated moves never leave the mover's king in check.
    #[test]
    fn generated_moves_never_leave_king_in_check(seed in seed_strategy(), len in walk_length_strategy()) {
        let (mut board, _) = random_walk(seed, len);
        let side = board.side_to_move();

        let moves = board.generate_moves();
        for &mv in moves.iter() {
            let info = board.make_move(mv);
            prop_assert!(!board.in_check(side), "{} leaves the king en prise", mv);
            board.unmake_move(mv, &info);
        }
    }

    /// Capture-only generation is exactly the noisy subset of the full
    /// move list.
    #[test]
    fn capture_gen_is_a_subset(seed in seed_strategy(), len in walk_length_strategy()) {
        use super::GenMode;

        let (board, _) = random_walk(seed, len);
        let all = board.generate_moves();
        let captures = board.generate(GenMode::Captures);

        for &mv in captures.iter() {
            prop_assert!(mv.is_noisy());
            prop_assert!(all.contains(mv));
        }
        let noisy = all.iter().filter(|m| m.is_noisy()).count();
        prop_assert_eq!(captures.len(), noisy);
    }

    /// A parsed move string round-trips through display.
    #[test]
    fn move_notation_roundtrip(seed in seed_strategy(), len in walk_length_strategy()) {
        let (board, _) = random_walk(seed, len);
        for &mv in board.generate_moves().iter() {
            let parsed = board.parse_move(&mv.to_string()).unwrap();
            prop_assert_eq!(parsed, mv);
        }
    }
}
