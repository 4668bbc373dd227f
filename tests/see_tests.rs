use ember::board::Board;
use ember::moves::execute::parse_uci_move;
use ember::moves::magic::loader::load_magic_tables;
use ember::search::see::SeeExt;
use std::str::FromStr;

fn see_of(fen: &str, move_text: &str, threshold: i32) -> bool {
    let tables = load_magic_tables();
    let board = Board::from_str(fen).unwrap();
    let mv = parse_uci_move(&board, move_text, &tables)
        .unwrap_or_else(|| panic!("{move_text} not legal in {fen}"));
    board.static_exchange_eval(mv, threshold, &tables)
}

#[test]
fn free_pawn_is_winning() {
    // Rook takes an undefended pawn.
    assert!(see_of("4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1", "d1d5", 0));
    assert!(see_of("4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1", "d1d5", 100));
    assert!(!see_of("4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1", "d1d5", 101));
}

#[test]
fn rook_takes_defended_pawn_loses_material() {
    // The pawn on d5 is defended by the e6 pawn: RxP, pxR nets -400.
    assert!(!see_of("4k3/8/4p3/3p4/8/8/8/3RK3 w - - 0 1", "d1d5", 0));
}

#[test]
fn equal_trade_passes_zero_threshold() {
    // Knight takes knight, recapture by pawn: 320 - 320 >= 0 stands only
    // if the first capture wins the piece before the recapture; the swap
    // nets exactly 0 here... knight for knight.
    assert!(see_of(
        "4k3/8/2p5/3n4/8/4N3/8/4K3 w - - 0 1",
        "e3d5",
        0
    ));
    assert!(!see_of(
        "4k3/8/2p5/3n4/8/4N3/8/4K3 w - - 0 1",
        "e3d5",
        1
    ));
}

#[test]
fn xray_attackers_join_the_exchange() {
    // White queen takes a pawn defended by a rook; behind the white queen
    // stands a white rook on the same file. QxP, rxQ, RxR: the queen is
    // still lost for pawn + rook, a bad trade.
    assert!(!see_of(
        "3rk3/8/8/3p4/8/8/3Q4/3RK3 w - - 0 1",
        "d2d5",
        0
    ));
    // Pawn takes, supported by the stacked pieces, is fine.
    assert!(see_of("3rk3/8/8/3p4/4P3/8/3Q4/3RK3 w - - 0 1", "e4d5", 0));
}

#[test]
fn promotion_capture_counts_the_new_queen() {
    // gxh8=Q wins a rook and upgrades the pawn; hugely positive.
    assert!(see_of(
        "4k2r/6P1/8/8/8/8/8/4K3 w - - 0 1",
        "g7h8q",
        500
    ));
}

#[test]
fn en_passant_is_a_pawn_trade() {
    // c7 guards d6, so exd6 cxd6 nets exactly a pawn for a pawn.
    assert!(see_of("4k3/2p5/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6", 0));
    assert!(!see_of("4k3/2p5/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6", 1));
}
