//! Perft node counts against the standard reference positions.
//!
//! Any divergence from these totals means a move generation bug, so
//! every class of special move (castling, en passant, promotion,
//! pins, discovered checks) is covered by at least one position.

use halberd::board::START_FEN;
use halberd::Board;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
const POSITION_6: &str =
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

fn expect_perft(fen: &str, cases: &[(u32, u64)]) {
    let mut board: Board = fen.parse().expect("valid fen");
    for &(depth, nodes) in cases {
        assert_eq!(
            board.perft(depth),
            nodes,
            "perft({depth}) mismatch for {fen}"
        );
    }
}

#[test]
fn perft_startpos() {
    expect_perft(
        START_FEN,
        &[(1, 20), (2, 400), (3, 8_902), (4, 197_281), (5, 4_865_609)],
    );
}

#[test]
fn perft_kiwipete() {
    expect_perft(KIWIPETE, &[(1, 48), (2, 2_039), (3, 97_862), (4, 4_085_603)]);
}

#[test]
fn perft_position_3() {
    expect_perft(
        POSITION_3,
        &[(1, 14), (2, 191), (3, 2_812), (4, 43_238), (5, 674_624)],
    );
}

#[test]
fn perft_position_4() {
    expect_perft(POSITION_4, &[(1, 6), (2, 264), (3, 9_467), (4, 422_333)]);
}

#[test]
fn perft_position_5() {
    expect_perft(POSITION_5, &[(1, 44), (2, 1_486), (3, 62_379), (4, 2_103_487)]);
}

#[test]
fn perft_position_6() {
    expect_perft(POSITION_6, &[(1, 46), (2, 2_079), (3, 89_890), (4, 3_894_594)]);
}

#[test]
fn perft_divide_matches_total() {
    let mut board: Board = KIWIPETE.parse().unwrap();
    let divide = board.perft_divide(3);
    assert_eq!(divide.len(), 48);
    let total: u64 = divide.iter().map(|&(_, nodes)| nodes).sum();
    assert_eq!(total, 97_862);
}

// The deep counts take minutes in debug builds. Run with
// `cargo test --release -- --ignored`.

#[test]
#[ignore]
fn perft_startpos_deep() {
    expect_perft(START_FEN, &[(6, 119_060_324)]);
}

#[test]
#[ignore]
fn perft_kiwipete_deep() {
    expect_perft(KIWIPETE, &[(5, 193_690_690)]);
}

#[test]
#[ignore]
fn perft_position_5_deep() {
    expect_perft(POSITION_5, &[(5, 89_941_194)]);
}
