use ember::board::Board;
use ember::moves::magic::MagicTables;
use ember::moves::magic::loader::load_magic_tables;
use ember::search::limits::SearchLimits;
use ember::search::params::SearchParams;
use ember::search::search::{SearchReport, search};
use ember::search::tt::{MATE_SCORE, MATE_THRESHOLD, TranspositionTable};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn run_search(fen: &str, depth: i32, tables: &MagicTables) -> SearchReport {
    let mut board = Board::from_str(fen).unwrap();
    let mut tt = TranspositionTable::new(16);
    let params = SearchParams::default();
    search(
        &mut board,
        tables,
        &mut tt,
        &params,
        None,
        SearchLimits::depth(depth),
        Arc::new(AtomicBool::new(false)),
    )
}

#[test]
fn startpos_picks_a_mainstream_opening_move() {
    let tables = load_magic_tables();
    let report = run_search(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        6,
        &tables,
    );
    let best = report.best_move.unwrap().to_uci();
    assert!(
        ["e2e4", "d2d4", "g1f3", "c2c4", "e2e3", "d2d3", "b1c3"].contains(&best.as_str()),
        "odd opening choice: {best}"
    );
}

#[test]
fn finds_back_rank_mate_in_one() {
    let tables = load_magic_tables();
    let report = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 10, &tables);
    assert_eq!(report.best_move.unwrap().to_uci(), "a1a8");
    // Mate in one = mate at ply 1.
    assert_eq!(report.score, MATE_SCORE - 1);
}

#[test]
fn defends_against_scholars_mate() {
    let tables = load_magic_tables();
    // After 1.e4 e5 2.Qh5 Nc6 3.Bc4, Black must cover f7.
    let report = run_search(
        "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 3 3",
        8,
        &tables,
    );
    let best = report.best_move.unwrap().to_uci();
    assert_ne!(best, "f7f6", "f6 walks into Qxf7 mate");
    // The score must not already concede a mate.
    assert!(report.score > -MATE_THRESHOLD);
}

#[test]
fn promotes_with_a_winning_score() {
    let tables = load_magic_tables();
    let report = run_search("8/P7/8/8/8/8/8/k6K w - - 0 1", 10, &tables);
    assert_eq!(report.best_move.unwrap().to_uci(), "a7a8q");
    assert!(
        report.score >= 800,
        "promotion should score at least +800cp, got {}",
        report.score
    );
}

/// King-and-pawn zugzwang: the engine must keep the opposition rather than
/// throw the pawn away. Any non-blundering king move wins or holds.
#[test]
fn zugzwang_endgame_keeps_the_pawn() {
    let tables = load_magic_tables();
    let report = run_search("8/8/8/4k3/8/4K3/4P3/8 w - - 0 1", 10, &tables);
    let best = report.best_move.unwrap().to_uci();
    // Kd4/Kf4 walk away from the pawn; everything else holds the draw or
    // better and a sidestep keeps the opposition.
    assert!(
        ["e3d3", "e3f3", "e2e4", "e3e2", "e3f2", "e3d2"].contains(&best.as_str()),
        "unexpected move {best}"
    );
    assert!(
        report.score >= -50,
        "white should not be losing here, got {}",
        report.score
    );
}

#[test]
fn stalemate_scores_zero_with_no_move() {
    let tables = load_magic_tables();
    // Black to move, no legal moves, not in check.
    let report = run_search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 6, &tables);
    assert!(report.best_move.is_none());
    assert_eq!(report.score, 0);
}

#[test]
fn checkmated_side_has_no_move() {
    let tables = load_magic_tables();
    // Back-rank mate already delivered.
    let report = run_search("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", 4, &tables);
    assert!(report.best_move.is_none());
}

#[test]
fn mate_scores_shorten_with_proximity() {
    let tables = load_magic_tables();
    // Two connected passers about to queen; White mates shortly. The
    // absolute score must stay inside the mate window arithmetic.
    let report = run_search("6k1/5ppp/8/8/8/8/5PPP/RR4K1 w - - 0 1", 8, &tables);
    if report.score >= MATE_THRESHOLD {
        assert!(report.score < MATE_SCORE);
    }
}

#[test]
fn node_limit_stops_the_search() {
    let tables = load_magic_tables();
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(4);
    let params = SearchParams::default();
    let limits = SearchLimits {
        nodes: Some(20_000),
        ..SearchLimits::default()
    };
    let report = search(
        &mut board,
        &tables,
        &mut tt,
        &params,
        None,
        limits,
        Arc::new(AtomicBool::new(false)),
    );
    assert!(report.best_move.is_some(), "a move must survive an abort");
    // The counter is polled every 2048 nodes; allow one polling window.
    assert!(report.nodes <= 20_000 + 2_048);
}

#[test]
fn stop_flag_aborts_quickly() {
    let tables = load_magic_tables();
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(4);
    let params = SearchParams::default();
    let stop = Arc::new(AtomicBool::new(true)); // pre-set: abort immediately
    let report = search(
        &mut board,
        &tables,
        &mut tt,
        &params,
        None,
        SearchLimits::depth(30),
        stop,
    );
    // Even a dead-on-arrival search returns a legal move.
    assert!(report.best_move.is_some());
}

#[test]
fn attacked_queen_retreats_instead_of_trading_down() {
    let tables = load_magic_tables();
    // Black's queen on h4 hangs to the g3 pawn; every capture loses her.
    let report = run_search(
        "rnb1kbnr/pppp1ppp/8/4p3/4PP1q/6P1/PPPP3P/RNBQKBNR b KQkq - 0 3",
        6,
        &tables,
    );
    let best = report.best_move.unwrap().to_uci();
    assert!(best.starts_with("h4"), "queen must move, played {best}");
    assert!(
        report.score > -300,
        "black should not be down a piece, got {}",
        report.score
    );
}

#[test]
fn pv_line_is_playable(){
    let tables = load_magic_tables();
    let report = run_search(
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        6,
        &tables,
    );
    let mut board = Board::from_str(
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    )
    .unwrap();
    assert!(!report.pv.is_empty());
    for mv in &report.pv {
        let parsed = ember::moves::execute::parse_uci_move(&board, &mv.to_uci(), &tables);
        let Some(legal) = parsed else {
            panic!("pv move {mv} is not legal in its position");
        };
        ember::moves::execute::make_move(&mut board, legal);
    }
}
