use crate::board::{Board, Piece};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::see::SeeExt;

// Score bands, highest first: hash move, queen promotions, winning/equal
// captures, other promotions, killers. Losing captures drop into negative
// history territory so they still sort above quiets with a bad record.
const HASH_MOVE_SCORE: i32 = 2_000_000;
const QUEEN_PROMO_SCORE: i32 = 1_000_000;
const GOOD_CAPTURE_BASE: i32 = 500_000;
const MINOR_PROMO_SCORE: i32 = 400_000;
const KILLER1_SCORE: i32 = 300_000;
const KILLER2_SCORE: i32 = 290_000;
const LOSING_CAPTURE_BASE: i32 = -8_000;

/// Most-valuable-victim / least-valuable-attacker capture score.
pub fn mvv_lva_score(mv: Move, board: &Board) -> i32 {
    if !mv.is_capture() {
        return 0;
    }
    if mv.is_en_passant() {
        // Pawn takes pawn; the target square itself is empty.
        return Piece::Pawn.value() * 10 - Piece::Pawn.attacker_value();
    }
    match board.piece_type_at(mv.to()) {
        Some(victim) => victim.value() * 10 - mv.piece().attacker_value(),
        None => 0,
    }
}

#[inline]
fn same_move(a: Move, b: Option<Move>) -> bool {
    b == Some(a)
}

/// Order a pseudo-legal move list in place for the main search.
pub fn order_moves(
    moves: &mut [Move],
    board: &Board,
    tables: &MagicTables,
    hash_move: Option<Move>,
    killers: &[Option<Move>; 2],
    history: &[[i32; 64]; 64],
) {
    moves.sort_by_cached_key(|&mv| {
        if same_move(mv, hash_move) {
            return -HASH_MOVE_SCORE;
        }

        if let Some(promo) = mv.promotion() {
            let score = if promo == Piece::Queen {
                QUEEN_PROMO_SCORE + mvv_lva_score(mv, board)
            } else {
                MINOR_PROMO_SCORE + promo.value()
            };
            return -score;
        }

        if mv.is_capture() {
            let mvv = mvv_lva_score(mv, board);
            let score = if board.static_exchange_eval(mv, 0, tables) {
                GOOD_CAPTURE_BASE + mvv
            } else {
                LOSING_CAPTURE_BASE + mvv / 10
            };
            return -score;
        }

        if same_move(mv, killers[0]) {
            return -KILLER1_SCORE;
        }
        if same_move(mv, killers[1]) {
            return -KILLER2_SCORE;
        }

        -history[mv.from().index() as usize][mv.to().index() as usize]
    });
}

/// Quiescence ordering: SEE classification first, MVV-LVA as tiebreak.
pub fn order_qsearch_moves(
    moves: &mut [Move],
    board: &Board,
    tables: &MagicTables,
    hash_move: Option<Move>,
) {
    moves.sort_by_cached_key(|&mv| {
        if same_move(mv, hash_move) {
            return -HASH_MOVE_SCORE;
        }
        if let Some(promo) = mv.promotion() {
            let score = if promo == Piece::Queen {
                QUEEN_PROMO_SCORE + mvv_lva_score(mv, board)
            } else {
                MINOR_PROMO_SCORE + promo.value()
            };
            return -score;
        }
        let mvv = mvv_lva_score(mv, board);
        let score = if board.static_exchange_eval(mv, 0, tables) {
            GOOD_CAPTURE_BASE + mvv
        } else {
            LOSING_CAPTURE_BASE + mvv / 10
        };
        -score
    });
}
