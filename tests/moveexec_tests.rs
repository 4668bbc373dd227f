use ember::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use ember::moves::execute::{generate_legal, make_move, parse_uci_move, undo_move};
use ember::moves::magic::loader::load_magic_tables;
use ember::square::Square;
use std::str::FromStr;

fn mv(board: &Board, text: &str, tables: &ember::moves::magic::MagicTables) -> ember::moves::types::Move {
    parse_uci_move(board, text, tables).unwrap_or_else(|| panic!("move {text} not legal"))
}

#[test]
fn every_legal_move_round_trips_exactly() {
    let tables = load_magic_tables();
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
        "4k3/P6P/8/8/8/8/p6p/4K3 w - - 0 1",
        "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
    ];

    for fen in fens {
        let mut board = Board::from_str(fen).unwrap();
        let mut moves = Vec::new();
        let mut scratch = Vec::with_capacity(256);
        generate_legal(&mut board, &tables, &mut moves, &mut scratch);
        assert!(!moves.is_empty(), "no moves in {fen}");

        for m in moves {
            let before = board.clone();
            let undo = make_move(&mut board, m);
            undo_move(&mut board, undo);
            assert_eq!(board, before, "{m} did not round-trip in {fen}");
        }
    }
}

#[test]
fn capture_updates_material_and_mailbox() {
    let tables = load_magic_tables();
    let mut board =
        Board::from_str("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2").unwrap();

    let take = mv(&board, "e4d5", &tables);
    assert!(take.is_capture());
    make_move(&mut board, take);

    assert_eq!(board.pieces(Piece::Pawn, Color::Black).count_ones(), 7);
    assert_eq!(
        board.piece_at(Square::from_str("d5").unwrap()),
        Some((Color::White, Piece::Pawn))
    );
    assert_eq!(board.halfmove_clock, 0);
}

#[test]
fn en_passant_removes_the_bypassing_pawn() {
    let tables = load_magic_tables();
    let mut board = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();

    let ep = mv(&board, "e5d6", &tables);
    assert!(ep.is_en_passant());
    make_move(&mut board, ep);

    assert_eq!(board.pieces(Piece::Pawn, Color::Black), 0);
    assert_eq!(
        board.piece_at(Square::from_str("d6").unwrap()),
        Some((Color::White, Piece::Pawn))
    );
    assert_eq!(board.piece_at(Square::from_str("d5").unwrap()), None);
}

#[test]
fn castling_moves_both_king_and_rook() {
    let tables = load_magic_tables();
    let mut board = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

    let oo = mv(&board, "e1g1", &tables);
    assert!(oo.is_kingside_castle());
    let undo = make_move(&mut board, oo);

    assert_eq!(
        board.piece_at(Square::from_str("g1").unwrap()),
        Some((Color::White, Piece::King))
    );
    assert_eq!(
        board.piece_at(Square::from_str("f1").unwrap()),
        Some((Color::White, Piece::Rook))
    );
    assert_eq!(board.castling_rights & (CASTLE_WK | CASTLE_WQ), 0);
    // Black's rights survive.
    assert_ne!(board.castling_rights & (CASTLE_BK | CASTLE_BQ), 0);

    undo_move(&mut board, undo);
    assert_eq!(board.castling_rights, CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ);
}

#[test]
fn rook_moves_and_rook_captures_clear_rights() {
    let tables = load_magic_tables();

    // Rook leaves its corner.
    let mut board = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let m = mv(&board, "h1h2", &tables);
    make_move(&mut board, m);
    assert_eq!(board.castling_rights & CASTLE_WK, 0);
    assert_ne!(board.castling_rights & CASTLE_WQ, 0);

    // Rook gets captured on its corner.
    let mut board = Board::from_str("r3k2r/8/8/8/8/8/6q1/R3K2R b KQkq - 0 1").unwrap();
    let m = mv(&board, "g2h1", &tables);
    make_move(&mut board, m);
    assert_eq!(board.castling_rights & CASTLE_WK, 0);
}

/// A promotion capture landing on a corner rook must clear the victim's
/// castling right in the same make path as any other corner capture.
#[test]
fn promotion_capture_on_corner_clears_victims_right() {
    let tables = load_magic_tables();
    let mut board =
        Board::from_str("rnbqk2r/ppppppPp/8/8/8/8/PPPPPP1P/RNBQKBNR w KQkq - 0 1").unwrap();

    let promo_take = mv(&board, "g7h8q", &tables);
    assert!(promo_take.is_promotion() && promo_take.is_capture());
    let undo = make_move(&mut board, promo_take);

    assert_eq!(board.castling_rights & CASTLE_BK, 0, "black O-O right must die");
    assert_ne!(board.castling_rights & CASTLE_BQ, 0);
    assert_eq!(
        board.piece_at(Square::from_str("h8").unwrap()),
        Some((Color::White, Piece::Queen))
    );
    assert_eq!(board.pieces(Piece::Pawn, Color::White).count_ones(), 6);

    undo_move(&mut board, undo);
    assert_ne!(board.castling_rights & CASTLE_BK, 0);
    assert_eq!(
        board.piece_at(Square::from_str("h8").unwrap()),
        Some((Color::Black, Piece::Rook))
    );
}

#[test]
fn underpromotions_are_generated_and_apply() {
    let tables = load_magic_tables();
    let board = Board::from_str("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();

    for (text, piece) in [
        ("a7a8q", Piece::Queen),
        ("a7a8r", Piece::Rook),
        ("a7a8b", Piece::Bishop),
        ("a7a8n", Piece::Knight),
    ] {
        let mut b = board.clone();
        let m = mv(&b, text, &tables);
        make_move(&mut b, m);
        assert_eq!(
            b.piece_at(Square::from_str("a8").unwrap()),
            Some((Color::White, piece))
        );
        assert_eq!(b.pieces(Piece::Pawn, Color::White), 0);
    }
}

#[test]
fn double_push_sets_ep_square_and_quiet_move_clears_it() {
    let tables = load_magic_tables();
    let mut board = Board::new();

    let push = mv(&board, "e2e4", &tables);
    make_move(&mut board, push);
    assert_eq!(board.en_passant, Some(Square::from_str("e3").unwrap()));

    let knight = mv(&board, "g8f6", &tables);
    make_move(&mut board, knight);
    assert_eq!(board.en_passant, None);
}

#[test]
fn fullmove_number_increments_after_black() {
    let tables = load_magic_tables();
    let mut board = Board::new();
    assert_eq!(board.fullmove_number, 1);
    let white_move = mv(&board, "e2e4", &tables);
    make_move(&mut board, white_move);
    assert_eq!(board.fullmove_number, 1);
    let black_move = mv(&board, "e7e5", &tables);
    make_move(&mut board, black_move);
    assert_eq!(board.fullmove_number, 2);
}

/// Move-text round trip: parsing a generated move's coordinate form yields
/// the same packed move.
#[test]
fn move_text_round_trips() {
    let tables = load_magic_tables();
    let mut board = Board::from_str(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let mut moves = Vec::new();
    let mut scratch = Vec::with_capacity(256);
    generate_legal(&mut board, &tables, &mut moves, &mut scratch);

    for m in moves {
        let parsed = parse_uci_move(&board, &m.to_uci(), &tables).expect("parses");
        assert_eq!(parsed, m);
    }
}
