use ember::board::Board;
use ember::moves::execute::{generate_legal, make_move, undo_move};
use ember::moves::magic::loader::load_magic_tables;
use ember::nnue::{
    Accumulator, HIDDEN_SIZE, NnueNetwork, NnueStack, OUTPUT_BUCKETS, output_bucket,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;

/// Small random weights keep the i16 accumulators far from saturation
/// (32 pieces x |w| <= 24 plus bias stays well inside i16).
fn random_network(seed: u64) -> NnueNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    let ft_weights: Box<[i16]> = (0..NnueNetwork::FT_WEIGHT_COUNT)
        .map(|_| rng.random_range(-24..=24))
        .collect();
    let ft_biases: Box<[i16]> = (0..HIDDEN_SIZE).map(|_| rng.random_range(-64..=64)).collect();
    let output_weights: Box<[i16]> = (0..NnueNetwork::OUTPUT_WEIGHT_COUNT)
        .map(|_| rng.random_range(-48..=48))
        .collect();
    let output_biases: Box<[i16]> = (0..OUTPUT_BUCKETS).map(|_| rng.random_range(-100..=100)).collect();
    NnueNetwork::from_parts(ft_weights, ft_biases, output_weights, output_biases)
}

#[test]
fn weight_file_round_trips() {
    let net = random_network(11);
    let path = std::env::temp_dir().join("ember_nnue_roundtrip.bin");
    net.save(&path).unwrap();

    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        NnueNetwork::expected_file_size()
    );

    let restored = NnueNetwork::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    // Same weights produce the same evaluation everywhere we care to look.
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/P7/8/8/8/8/8/k6K w - - 0 1",
    ] {
        let board = Board::from_str(fen).unwrap();
        let mut a = Accumulator::dirty();
        let mut b = Accumulator::dirty();
        a.refresh(&board, &net);
        b.refresh(&board, &restored);
        assert_eq!(a.evaluate(&board, &net), b.evaluate(&board, &restored));
    }
}

#[test]
fn truncated_or_padded_files_are_rejected() {
    let net = random_network(12);
    let path = std::env::temp_dir().join("ember_nnue_badsize.bin");
    net.save(&path).unwrap();

    // Chop off the trailer: size check must fail.
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();
    assert!(NnueNetwork::load(&path).is_err());

    // One byte too many fails too.
    let mut padded = bytes.clone();
    padded.push(0);
    std::fs::write(&path, &padded).unwrap();
    assert!(NnueNetwork::load(&path).is_err());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn output_bucket_tracks_piece_count() {
    // 32 pieces -> top bucket; bare kings -> bucket 0.
    let full = Board::new();
    assert_eq!(output_bucket(&full), OUTPUT_BUCKETS - 1);

    let bare = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(output_bucket(&bare), 0);

    // (piece_count - 2) / 4: 10 pieces -> bucket 2.
    let ten = Board::from_str("r3k2r/pppp4/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_eq!(ten.piece_count(), 10);
    assert_eq!(output_bucket(&ten), 2);
}

/// The incremental path must agree with a from-scratch refresh at every
/// node of a random game, including after king moves, castling, and
/// promotions force refreshes.
#[test]
fn incremental_updates_match_full_refresh() {
    let tables = load_magic_tables();
    let net = random_network(13);
    let mut rng = StdRng::seed_from_u64(99);

    for _game in 0..6 {
        let mut board = Board::new();
        let mut stack = NnueStack::new(&net, &board);

        for _ply in 0..80 {
            let mut moves = Vec::new();
            let mut scratch = Vec::with_capacity(256);
            generate_legal(&mut board, &tables, &mut moves, &mut scratch);
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.random_range(0..moves.len())];

            stack.push(&board, mv);
            make_move(&mut board, mv);

            let incremental = stack.evaluate(&board);
            let mut fresh = Accumulator::dirty();
            fresh.refresh(&board, &net);
            assert_eq!(
                incremental,
                fresh.evaluate(&board, &net),
                "incremental/refresh divergence after {mv}"
            );
        }
    }
}

/// Pushing and popping restores the previous accumulator byte-for-byte.
#[test]
fn push_pop_restores_previous_entry() {
    let tables = load_magic_tables();
    let net = random_network(14);
    let mut board =
        Board::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let mut stack = NnueStack::new(&net, &board);

    let mut moves = Vec::new();
    let mut scratch = Vec::with_capacity(256);
    generate_legal(&mut board, &tables, &mut moves, &mut scratch);

    for mv in moves {
        let snapshot = stack.top().clone();

        stack.push(&board, mv);
        let undo = make_move(&mut board, mv);
        let _ = stack.evaluate(&board); // may refresh the dirty top entry
        undo_move(&mut board, undo);
        stack.pop();

        assert!(
            *stack.top() == snapshot,
            "accumulator not restored after {mv}"
        );
        assert_eq!(stack.depth(), 1);
    }
}

/// A refresh triggered lazily after a king move must land on exactly the
/// same values as an immediate refresh: the single-refresh-path invariant.
#[test]
fn king_moves_switch_buckets_consistently() {
    let tables = load_magic_tables();
    let net = random_network(15);

    // King walks across the bucket map's boundary files.
    let mut board = Board::from_str("4k3/8/8/8/8/8/4P3/3K4 w - - 0 1").unwrap();
    let mut stack = NnueStack::new(&net, &board);

    for text in ["d1e1", "e8d8", "e1f1", "d8e8", "f1g1", "e8f8"] {
        let mv = ember::moves::execute::parse_uci_move(&board, text, &tables)
            .unwrap_or_else(|| panic!("{text} should be legal"));
        stack.push(&board, mv);
        make_move(&mut board, mv);

        let lazy = stack.evaluate(&board);
        let mut eager = Accumulator::dirty();
        eager.refresh(&board, &net);
        assert_eq!(lazy, eager.evaluate(&board, &net));
    }
}
