use crate::board::castle_bits::*;
use crate::board::{Board, Color, EMPTY_SQ, Piece};
use crate::hash::zobrist::{ep_file_to_hash, xor_castling_rights_delta, zobrist_keys};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::square_control::{in_check, is_legal_castling};
use crate::moves::types::{Move, MoveBuffer, NullUndo, Undo};
use crate::square::Square;

/// Rook relocation for a castle, keyed by the king's destination.
#[inline(always)]
fn rook_castle_squares(king_to: u8) -> Option<(Square, Square)> {
    match king_to {
        6 => Some((Square::from_index(7), Square::from_index(5))), // White O-O
        2 => Some((Square::from_index(0), Square::from_index(3))), // White O-O-O
        62 => Some((Square::from_index(63), Square::from_index(61))), // Black O-O
        58 => Some((Square::from_index(56), Square::from_index(59))), // Black O-O-O
        _ => None,
    }
}

/// Right cleared when a rook of `color` leaves (or is captured on) `rook_sq`.
#[inline(always)]
fn rights_mask_for_rook(color: Color, rook_sq: u8) -> u8 {
    match (color, rook_sq) {
        (Color::White, 0) => CASTLE_WQ,
        (Color::White, 7) => CASTLE_WK,
        (Color::Black, 56) => CASTLE_BQ,
        (Color::Black, 63) => CASTLE_BK,
        _ => 0,
    }
}

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, piece: Piece, sq: Square) {
    let bb = board.bb(color, piece) & !sq.bb();
    board.set_bb(color, piece, bb);
}

#[inline(always)]
fn place_piece(board: &mut Board, color: Color, piece: Piece, sq: Square) {
    let bb = board.bb(color, piece) | sq.bb();
    board.set_bb(color, piece, bb);
}

/// Apply `mv` to the board and return the record needed to reverse it.
/// The Zobrist key is maintained incrementally; the pre-move key is pushed
/// onto the repetition history.
pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let prev_zobrist = board.zobrist;
    let color = board.side_to_move;
    let piece = mv.piece();
    let to_idx = mv.to().index();

    // An en-passant file in the hash is keyed off the *pre-move* position;
    // XOR it out before anything else changes.
    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }

    let prev_en_passant = board.en_passant;
    let prev_halfmove_clock = board.halfmove_clock;
    let prev_fullmove_number = board.fullmove_number;
    board.en_passant = None;

    // Remove the captured piece first so the mover can land on its square.
    let capture = if mv.is_en_passant() {
        let victim = Square::from_index(match color {
            Color::White => to_idx - 8,
            Color::Black => to_idx + 8,
        });
        remove_piece(board, color.opposite(), Piece::Pawn, victim);
        Some((Piece::Pawn, victim))
    } else {
        let occupant = board.mailbox[to_idx as usize];
        if occupant != EMPTY_SQ {
            let cap_piece = Piece::from_u8(occupant & 0b111);
            debug_assert_eq!(Color::from_u8(occupant >> 3), color.opposite());
            remove_piece(board, color.opposite(), cap_piece, mv.to());
            Some((cap_piece, mv.to()))
        } else {
            None
        }
    };

    // Castling rights: king move clears both for the mover, a rook leaving a
    // corner clears one, and capturing a rook on its corner clears the
    // victim's. A promotion capture on a corner takes the last path too.
    let old_rights = board.castling_rights;
    let mut mask_to_clear: u8 = 0;
    if piece == Piece::King {
        mask_to_clear |= match color {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if piece == Piece::Rook {
        mask_to_clear |= rights_mask_for_rook(color, mv.from().index());
    }
    if let Some((cap_piece, cap_sq)) = capture
        && cap_piece == Piece::Rook
    {
        mask_to_clear |= rights_mask_for_rook(color.opposite(), cap_sq.index());
    }
    let new_rights = old_rights & !mask_to_clear;
    if new_rights != old_rights {
        board.castling_rights = new_rights;
        xor_castling_rights_delta(&mut board.zobrist, zobrist_keys(), old_rights, new_rights);
    }

    // Double push exposes the passed-over square.
    if mv.is_double_pawn_push() {
        let ep_sq = match color {
            Color::White => mv.from().index() + 8,
            Color::Black => mv.from().index() - 8,
        };
        board.en_passant = Some(Square::from_index(ep_sq));
    }

    remove_piece(board, color, piece, mv.from());
    match mv.promotion() {
        Some(promo) => {
            debug_assert_eq!(piece, Piece::Pawn, "only pawns promote");
            place_piece(board, color, promo, mv.to());
        }
        None => place_piece(board, color, piece, mv.to()),
    }

    let castling_rook = if mv.is_castling() {
        rook_castle_squares(to_idx)
    } else {
        None
    };
    if let Some((rook_from, rook_to)) = castling_rook {
        remove_piece(board, color, Piece::Rook, rook_from);
        place_piece(board, color, Piece::Rook, rook_to);
    }

    if capture.is_some() || piece == Piece::Pawn {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock = prev_halfmove_clock + 1;
    }
    if color == Color::Black {
        board.fullmove_number = prev_fullmove_number + 1;
    }

    board.side_to_move = color.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;

    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }

    board.history.push(prev_zobrist);

    #[cfg(debug_assertions)]
    board.assert_hash();

    Undo {
        mv,
        capture,
        castling_rook,
        prev_castling_rights: old_rights,
        prev_en_passant,
        prev_halfmove_clock,
        prev_fullmove_number,
        prev_zobrist,
    }
}

/// Exact reverse of `make_move`. The Zobrist key is restored from the undo
/// record, not reconstructed.
pub fn undo_move(board: &mut Board, undo: Undo) {
    let mv = undo.mv;
    let color = board.side_to_move.opposite(); // the mover

    match mv.promotion() {
        Some(promo) => {
            remove_piece(board, color, promo, mv.to());
            place_piece(board, color, Piece::Pawn, mv.from());
        }
        None => {
            remove_piece(board, color, mv.piece(), mv.to());
            place_piece(board, color, mv.piece(), mv.from());
        }
    }

    if let Some((cap_piece, cap_sq)) = undo.capture {
        place_piece(board, color.opposite(), cap_piece, cap_sq);
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        remove_piece(board, color, Piece::Rook, rook_to);
        place_piece(board, color, Piece::Rook, rook_from);
    }

    board.side_to_move = color;
    board.castling_rights = undo.prev_castling_rights;
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;
    board.zobrist = undo.prev_zobrist;
    board.history.pop();

    #[cfg(debug_assertions)]
    board.assert_hash();
}

/// Flip the side to move without touching any piece. Used by null-move
/// pruning; the en-passant square dies with the tempo.
pub fn make_null_move(board: &mut Board) -> NullUndo {
    let undo = NullUndo {
        prev_en_passant: board.en_passant,
        prev_zobrist: board.zobrist,
    };

    board.history.push(board.zobrist);

    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }
    board.en_passant = None;

    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;

    undo
}

pub fn undo_null_move(board: &mut Board, undo: NullUndo) {
    board.side_to_move = board.side_to_move.opposite();
    board.en_passant = undo.prev_en_passant;
    board.zobrist = undo.prev_zobrist;
    board.history.pop();
}

/// Strict legality: make the move and reject it if the mover's king is left
/// attacked. Castling legality is fully checked at generation time.
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
    scratch: &mut impl MoveBuffer,
) {
    scratch.clear();
    generate_pseudo_legal(board, tables, scratch);
    moves.clear();

    for i in 0..scratch.len() {
        let mv = scratch[i];
        let mover = board.side_to_move;
        let undo = make_move(board, mv);
        let illegal = in_check(board, mover, tables);
        undo_move(board, undo);
        if !illegal {
            moves.push(mv);
        }
    }
}

/// Check one pseudo-legal move without materializing the full legal list.
#[inline]
pub fn is_legal_move(board: &mut Board, mv: Move, tables: &MagicTables) -> bool {
    if mv.is_castling() {
        return is_legal_castling(board, mv, tables);
    }
    let mover = board.side_to_move;
    let undo = make_move(board, mv);
    let illegal = in_check(board, mover, tables);
    undo_move(board, undo);
    !illegal
}

/// Resolve coordinate move text ("e2e4", "a7a8q") against the current legal
/// moves. Returns None when the text is unparsable or the move is illegal.
pub fn parse_uci_move(board: &Board, text: &str, tables: &MagicTables) -> Option<Move> {
    let bytes = text.as_bytes();
    if bytes.len() < 4 {
        return None;
    }

    let from_file = bytes[0].wrapping_sub(b'a');
    let from_rank = bytes[1].wrapping_sub(b'1');
    let to_file = bytes[2].wrapping_sub(b'a');
    let to_rank = bytes[3].wrapping_sub(b'1');
    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    let from = Square::from_coords(from_file, from_rank);
    let to = Square::from_coords(to_file, to_rank);
    let promo = if bytes.len() >= 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => return None,
        }
    } else {
        None
    };

    let mut board_copy = board.clone();
    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(256);
    generate_legal(&mut board_copy, tables, &mut moves, &mut scratch);

    moves
        .into_iter()
        .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promo)
}
