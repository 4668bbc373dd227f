use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::square_control::is_legal_castling;
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;
use crate::utils::pop_lsb;

const RANK1: u64 = 0x0000_0000_0000_00FF;
const RANK2: u64 = 0x0000_0000_0000_FF00;
const RANK7: u64 = 0x00FF_0000_0000_0000;
const RANK8: u64 = 0xFF00_0000_0000_0000;

// Squares that must be empty between king and rook.
const WHITE_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060;
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E;
const BLACK_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000;
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000;

const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[inline(always)]
fn push_piece_moves(
    from: u8,
    mut targets: u64,
    enemy: u64,
    piece: Piece,
    move_list: &mut impl MoveBuffer,
) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        let flags = if enemy >> to & 1 != 0 { CAPTURE } else { QUIET_MOVE };
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            piece,
            flags,
        ));
    }
}

#[inline(always)]
fn kingside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_KINGSIDE_BETWEEN,
        Color::Black => BLACK_KINGSIDE_BETWEEN,
    }
}

#[inline(always)]
fn queenside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_QUEENSIDE_BETWEEN,
        Color::Black => BLACK_QUEENSIDE_BETWEEN,
    }
}

#[inline(always)]
fn pawn_attacks_for(color: Color, sq: usize) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[sq],
        Color::Black => BLACK_PAWN_ATTACKS[sq],
    }
}

pub fn generate_knight_moves(board: &Board, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy_without_king = board.opponent_occupancy(color) & !enemy_king;

    let mut bb = board.pieces(Piece::Knight, color);
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let targets = KNIGHT_ATTACKS[from as usize] & !friendly & !enemy_king;
        push_piece_moves(from, targets, enemy_without_king, Piece::Knight, move_list);
    }
}

pub fn generate_slider_moves(board: &Board, tables: &MagicTables, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy_without_king = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();

    for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let from = pop_lsb(&mut bb);
            let attacks = match piece {
                Piece::Bishop => tables.bishop.get_attacks(from as usize, blockers),
                Piece::Rook => tables.rook.get_attacks(from as usize, blockers),
                _ => tables.queen_attacks(from as usize, blockers),
            };
            let targets = attacks & !friendly & !enemy_king;
            push_piece_moves(from, targets, enemy_without_king, piece, move_list);
        }
    }
}

pub fn generate_king_moves(board: &Board, tables: &MagicTables, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let king_bb = board.pieces(Piece::King, color);
    if king_bb == 0 {
        return; // malformed position safeguard
    }

    let from = king_bb.trailing_zeros() as u8;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;

    let targets = KING_ATTACKS[from as usize] & !friendly & !enemy_king;
    push_piece_moves(from, targets, enemy, Piece::King, move_list);

    let occ = board.occupied();

    if board.has_kingside_castle(color) && occ & kingside_between(color) == 0 {
        let mv = Move::new(
            Square::from_index(from),
            Square::from_index(from + 2),
            Piece::King,
            KINGSIDE_CASTLE,
        );
        if is_legal_castling(board, mv, tables) {
            move_list.push(mv);
        }
    }

    if board.has_queenside_castle(color) && occ & queenside_between(color) == 0 {
        let mv = Move::new(
            Square::from_index(from),
            Square::from_index(from - 2),
            Piece::King,
            QUEENSIDE_CASTLE,
        );
        if is_legal_castling(board, mv, tables) {
            move_list.push(mv);
        }
    }
}

pub fn generate_pawn_moves(board: &Board, move_list: &mut impl MoveBuffer) {
    generate_pawn_quiets(board, move_list);
    generate_pawn_captures(board, move_list);
}

/// All pseudo-legal moves for the side to move. May leave the own king in
/// check; callers filter after make.
pub fn generate_pseudo_legal(board: &Board, tables: &MagicTables, moves: &mut impl MoveBuffer) {
    moves.clear();
    generate_pawn_moves(board, moves);
    generate_knight_moves(board, moves);
    generate_slider_moves(board, tables, moves);
    generate_king_moves(board, tables, moves);
}

// ---------------------------------------------------------------------------
// Split generators: quiescence wants captures + promotions only.
// ---------------------------------------------------------------------------

#[inline(always)]
fn push_captures_only(
    from: u8,
    targets: u64,
    enemy: u64,
    piece: Piece,
    move_list: &mut impl MoveBuffer,
) {
    let mut caps = targets & enemy;
    while caps != 0 {
        let to = pop_lsb(&mut caps);
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            piece,
            CAPTURE,
        ));
    }
}

fn generate_pawn_captures(board: &Board, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let enemy_without_king =
        board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());
    let empty = !board.occupied();

    let (promo_source_rank, promo_rank) = match color {
        Color::White => (RANK7, RANK8),
        Color::Black => (RANK2, RANK1),
    };

    // Plain captures from non-promoting ranks.
    let mut attackers = pawns & !promo_source_rank;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        let mut targets = pawn_attacks_for(color, from as usize) & enemy_without_king & !promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            move_list.push(Move::new(
                Square::from_index(from),
                Square::from_index(to),
                Piece::Pawn,
                CAPTURE,
            ));
        }
    }

    // Promotion pushes.
    let promo_pushes = match color {
        Color::White => (pawns & promo_source_rank) << 8 & empty,
        Color::Black => (pawns & promo_source_rank) >> 8 & empty,
    };
    let mut bb = promo_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        for &promo in PROMOS.iter() {
            move_list.push(Move::new_promotion(
                Square::from_index(from),
                Square::from_index(to),
                promo,
                PROMOTION,
            ));
        }
    }

    // Promotion captures.
    let mut promo_attackers = pawns & promo_source_rank;
    while promo_attackers != 0 {
        let from = pop_lsb(&mut promo_attackers);
        let mut targets = pawn_attacks_for(color, from as usize) & enemy_without_king & promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            for &promo in PROMOS.iter() {
                move_list.push(Move::new_promotion(
                    Square::from_index(from),
                    Square::from_index(to),
                    promo,
                    PROMOTION_CAPTURE,
                ));
            }
        }
    }

    // En passant: target square must be empty and the victim pawn present.
    if let Some(ep_sq) = board.en_passant {
        let ep = ep_sq.index();
        if empty >> ep & 1 != 0 {
            let victim_sq = match color {
                Color::White => ep - 8,
                Color::Black => ep + 8,
            };
            let enemy_pawns = board.pieces(Piece::Pawn, color.opposite());
            if enemy_pawns >> victim_sq & 1 != 0 {
                let mut atk = pawns;
                while atk != 0 {
                    let from = pop_lsb(&mut atk);
                    if pawn_attacks_for(color, from as usize) & (1u64 << ep) != 0 {
                        move_list.push(Move::new(
                            Square::from_index(from),
                            Square::from_index(ep),
                            Piece::Pawn,
                            EN_PASSANT,
                        ));
                    }
                }
            }
        }
    }
}

fn generate_pawn_quiets(board: &Board, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let empty = !board.occupied();

    let promo_rank = match color {
        Color::White => RANK8,
        Color::Black => RANK1,
    };

    let single_pushes = match color {
        Color::White => (pawns << 8) & empty & !promo_rank,
        Color::Black => (pawns >> 8) & empty & !promo_rank,
    };
    let mut bb = single_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            Piece::Pawn,
            QUIET_MOVE,
        ));
    }

    let double_pushes = match color {
        Color::White => ((pawns & RANK2) << 8 & empty) << 8 & empty,
        Color::Black => ((pawns & RANK7) >> 8 & empty) >> 8 & empty,
    };
    let mut bb = double_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 16,
            Color::Black => to + 16,
        };
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            Piece::Pawn,
            DOUBLE_PAWN_PUSH,
        ));
    }
}

/// Captures, promotions, and en passant only; the quiescence feed.
pub fn generate_pseudo_legal_captures(
    board: &Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
) {
    moves.clear();
    let color = board.side_to_move;
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy_without_king = board.opponent_occupancy(color) & !enemy_king;
    let friendly = board.occupancy(color);
    let blockers = board.occupied();

    generate_pawn_captures(board, moves);

    let mut knights = board.pieces(Piece::Knight, color);
    while knights != 0 {
        let from = pop_lsb(&mut knights);
        let targets = KNIGHT_ATTACKS[from as usize] & !friendly & !enemy_king;
        push_captures_only(from, targets, enemy_without_king, Piece::Knight, moves);
    }

    for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let from = pop_lsb(&mut bb);
            let attacks = match piece {
                Piece::Bishop => tables.bishop.get_attacks(from as usize, blockers),
                Piece::Rook => tables.rook.get_attacks(from as usize, blockers),
                _ => tables.queen_attacks(from as usize, blockers),
            };
            let targets = attacks & !friendly & !enemy_king;
            push_captures_only(from, targets, enemy_without_king, piece, moves);
        }
    }

    let king_bb = board.pieces(Piece::King, color);
    if king_bb != 0 {
        let from = king_bb.trailing_zeros() as u8;
        let targets = KING_ATTACKS[from as usize] & !friendly & !enemy_king;
        push_captures_only(from, targets, enemy_without_king, Piece::King, moves);
    }
}
