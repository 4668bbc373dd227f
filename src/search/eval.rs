//! Static evaluation. With a network loaded the NNUE accumulator does the
//! work; otherwise a tapered material + piece-square evaluation stands in.
//! Either way the result is centipawns from the side to move's perspective.

use crate::board::{Board, Color, PIECES, Piece};
use crate::nnue::NnueStack;
use crate::search::pesto;
use crate::utils::pop_lsb;

const KNIGHT_PHASE: i32 = 1;
const BISHOP_PHASE: i32 = 1;
const ROOK_PHASE: i32 = 2;
const QUEEN_PHASE: i32 = 4;
const TOTAL_PHASE: i32 = 24;

#[inline(always)]
pub fn mirror_vert(sq: u8) -> usize {
    (sq ^ 56) as usize
}

fn get_psqt(kind: Piece) -> (&'static [i32; 64], &'static [i32; 64]) {
    match kind {
        Piece::Pawn => (&pesto::PAWN_TABLE.0, &pesto::PAWN_TABLE.1),
        Piece::Knight => (&pesto::KNIGHT_TABLE.0, &pesto::KNIGHT_TABLE.1),
        Piece::Bishop => (&pesto::BISHOP_TABLE.0, &pesto::BISHOP_TABLE.1),
        Piece::Rook => (&pesto::ROOK_TABLE.0, &pesto::ROOK_TABLE.1),
        Piece::Queen => (&pesto::QUEEN_TABLE.0, &pesto::QUEEN_TABLE.1),
        Piece::King => (&pesto::KING_TABLE.0, &pesto::KING_TABLE.1),
    }
}

fn get_piece_value(kind: Piece) -> (i32, i32) {
    match kind {
        Piece::Pawn => pesto::PAWN_VAL,
        Piece::Knight => pesto::KNIGHT_VAL,
        Piece::Bishop => pesto::BISHOP_VAL,
        Piece::Rook => pesto::ROOK_VAL,
        Piece::Queen => pesto::QUEEN_VAL,
        Piece::King => pesto::KING_VAL,
    }
}

/// Game phase from remaining non-pawn material: 24 = opening, 0 = bare kings.
pub fn calculate_phase(board: &Board) -> i32 {
    let count = |p: Piece| {
        (board.pieces(p, Color::White).count_ones() + board.pieces(p, Color::Black).count_ones())
            as i32
    };

    let phase = count(Piece::Knight) * KNIGHT_PHASE
        + count(Piece::Bishop) * BISHOP_PHASE
        + count(Piece::Rook) * ROOK_PHASE
        + count(Piece::Queen) * QUEEN_PHASE;

    phase.clamp(0, TOTAL_PHASE)
}

/// White-relative tapered material + PSQT score.
pub fn pesto_eval(board: &Board) -> i32 {
    let mut mg_score = 0;
    let mut eg_score = 0;
    let phase = calculate_phase(board);

    for &piece in &PIECES {
        let (mg_val, eg_val) = get_piece_value(piece);
        let (mg_table, eg_table) = get_psqt(piece);

        // Tables hold rank 8 at index 0: mirror White, read Black directly.
        let mut white_bb = board.pieces(piece, Color::White);
        while white_bb != 0 {
            let sq = pop_lsb(&mut white_bb);
            let table_sq = mirror_vert(sq);
            mg_score += mg_val + mg_table[table_sq];
            eg_score += eg_val + eg_table[table_sq];
        }

        let mut black_bb = board.pieces(piece, Color::Black);
        while black_bb != 0 {
            let sq = pop_lsb(&mut black_bb) as usize;
            mg_score -= mg_val + mg_table[sq];
            eg_score -= eg_val + eg_table[sq];
        }
    }

    (mg_score * phase + eg_score * (TOTAL_PHASE - phase)) / TOTAL_PHASE
}

/// Classical fallback, side-to-move relative.
pub fn classical_eval(board: &Board) -> i32 {
    let white_relative = pesto_eval(board);
    match board.side_to_move {
        Color::White => white_relative,
        Color::Black => -white_relative,
    }
}

/// The search's single evaluation entry point.
#[inline]
pub fn static_eval(board: &Board, nnue: &mut Option<NnueStack<'_>>) -> i32 {
    match nnue {
        Some(stack) => stack.evaluate(board),
        None => classical_eval(board),
    }
}
