use crate::bitboard::BitboardExt;
use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::pawn_attacks;
use crate::moves::types::Move;
use crate::square::Square;

/// SEE piece values; the king's is a sentinel so a capture sequence never
/// profitably ends by giving up the king.
fn piece_value(p: Piece) -> i32 {
    match p {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20_000,
    }
}

pub trait SeeExt {
    /// True when the exchange on `m.to()` nets at least `threshold`
    /// centipawns for the mover.
    fn static_exchange_eval(&self, m: Move, threshold: i32, tables: &MagicTables) -> bool;
    fn attackers_to_square(&self, square: u8, occupancy: u64, tables: &MagicTables) -> u64;
}

impl SeeExt for Board {
    /// All pieces of both colors that attack `square` under `occupancy`.
    fn attackers_to_square(&self, square: u8, occupancy: u64, tables: &MagicTables) -> u64 {
        let sq = square as usize;

        let white_pawns =
            pawn_attacks(square, Color::Black) & self.pieces(Piece::Pawn, Color::White);
        let black_pawns =
            pawn_attacks(square, Color::White) & self.pieces(Piece::Pawn, Color::Black);

        let knights =
            self.pieces(Piece::Knight, Color::White) | self.pieces(Piece::Knight, Color::Black);
        let knight_attacks = KNIGHT_ATTACKS[sq] & knights;

        let kings = self.pieces(Piece::King, Color::White) | self.pieces(Piece::King, Color::Black);
        let king_attacks = KING_ATTACKS[sq] & kings;

        let bishop_queens = self.pieces(Piece::Bishop, Color::White)
            | self.pieces(Piece::Bishop, Color::Black)
            | self.pieces(Piece::Queen, Color::White)
            | self.pieces(Piece::Queen, Color::Black);
        let rook_queens = self.pieces(Piece::Rook, Color::White)
            | self.pieces(Piece::Rook, Color::Black)
            | self.pieces(Piece::Queen, Color::White)
            | self.pieces(Piece::Queen, Color::Black);

        let diag = tables.bishop.get_attacks(sq, occupancy) & bishop_queens;
        let orth = tables.rook.get_attacks(sq, occupancy) & rook_queens;

        (white_pawns | black_pawns | knight_attacks | king_attacks | diag | orth) & occupancy
    }

    fn static_exchange_eval(&self, m: Move, threshold: i32, tables: &MagicTables) -> bool {
        let to_sq = m.to().index();
        let from_sq = m.from().index();

        let first_victim = if m.is_en_passant() {
            Piece::Pawn
        } else {
            match self.piece_type_at(m.to()) {
                Some(p) => p,
                // Quiet move: nothing to win or lose on the square.
                None => return threshold <= 0,
            }
        };

        let mut value = piece_value(first_victim);
        if let Some(p) = m.promotion() {
            value += piece_value(p) - piece_value(Piece::Pawn);
        }
        if value < threshold {
            return false;
        }

        // The piece now standing on the square is the promoted piece when
        // the move promotes.
        let mut next_victim = match m.promotion() {
            Some(p) => p,
            None => m.piece(),
        };

        let mut gain = [0i32; 32];
        let mut d = 0usize;
        gain[0] = value;

        let mut occupancy = self.occupied() & !(1u64 << from_sq);
        let mut attackers = self.attackers_to_square(to_sq, occupancy, tables);
        let mut side = self.side_to_move.opposite();

        loop {
            d += 1;
            let attacker_sq = least_valuable_attacker(self, attackers, side);
            let Some(attacker_sq) = attacker_sq else { break };

            attackers &= !(1u64 << attacker_sq);
            occupancy &= !(1u64 << attacker_sq);

            // A slider vacating its square may reveal an x-ray attacker.
            if matches!(next_victim, Piece::Pawn | Piece::Bishop | Piece::Rook | Piece::Queen) {
                attackers = self.attackers_to_square(to_sq, occupancy, tables);
                attackers &= !(1u64 << attacker_sq);
            }

            if d >= 31 {
                break;
            }

            gain[d] = piece_value(next_victim) - gain[d - 1];
            next_victim = self
                .piece_type_at(Square::from_index(attacker_sq))
                .expect("attacker square is occupied");
            side = side.opposite();
        }

        while d > 1 {
            d -= 1;
            gain[d - 1] = -std::cmp::max(-gain[d - 1], gain[d]);
        }
        gain[0] >= threshold
    }
}

/// Lowest-valued attacker of `side` inside `attackers`, or None.
fn least_valuable_attacker(board: &Board, attackers: u64, side: Color) -> Option<u8> {
    let side_attackers = attackers & board.occupancy(side);
    if side_attackers == 0 {
        return None;
    }

    for piece in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let subset = side_attackers & board.pieces(piece, side);
        if subset != 0 {
            return Some(subset.lsb());
        }
    }
    None
}
