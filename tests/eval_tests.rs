use ember::board::Board;
use ember::search::eval::{calculate_phase, classical_eval, pesto_eval};
use std::str::FromStr;

#[test]
fn startpos_is_balanced() {
    let board = Board::new();
    assert_eq!(pesto_eval(&board), 0);
    assert_eq!(classical_eval(&board), 0);
}

/// Color-mirrored positions must score as exact negations.
#[test]
fn eval_is_color_symmetric() {
    let pairs = [
        (
            // White up a knight vs the mirrored position.
            "rnbqkb1r/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKB1R b KQkq - 0 1",
        ),
        (
            "4k3/8/8/8/8/8/PPP5/4K3 w - - 0 1",
            "4k3/ppp5/8/8/8/8/8/4K3 b - - 0 1",
        ),
    ];

    for (white_fen, black_fen) in pairs {
        let w = Board::from_str(white_fen).unwrap();
        let b = Board::from_str(black_fen).unwrap();
        assert_eq!(
            pesto_eval(&w),
            -pesto_eval(&b),
            "mirror asymmetry between {white_fen} and {black_fen}"
        );
    }
}

/// The same position seen by either side to move gives opposite
/// stm-relative values.
#[test]
fn classical_eval_is_stm_relative() {
    let white_to_move =
        Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let mut black_to_move = white_to_move.clone();
    black_to_move.side_to_move = ember::board::Color::Black;

    assert_eq!(classical_eval(&white_to_move), -classical_eval(&black_to_move));
}

#[test]
fn material_advantage_dominates() {
    // White has an extra queen.
    let board =
        Board::from_str("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    assert!(pesto_eval(&board) > 700);
}

#[test]
fn phase_spans_opening_to_endgame() {
    assert_eq!(calculate_phase(&Board::new()), 24);

    let bare = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(calculate_phase(&bare), 0);

    let rook_ending = Board::from_str("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
    assert_eq!(calculate_phase(&rook_ending), 2);
}

/// Passed-pawn-free sanity: a centralized knight outweighs a rim knight.
#[test]
fn psqt_prefers_central_knights() {
    let central = Board::from_str("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1").unwrap();
    let rim = Board::from_str("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
    assert!(pesto_eval(&central) > pesto_eval(&rim));
}
