// FEN parsing and emission, standard 6-field form.

use super::fen_tables::{CHAR_TO_PC, glyph_for};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

impl Board {
    /// Replace the whole board state from a FEN string.
    /// On error the board is left in an unspecified but valid-to-drop state.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN missing piece placement")?;
        let side = fields.next().ok_or("FEN missing side to move")?;
        let castling = fields.next().ok_or("FEN missing castling field")?;
        let ep = fields.next().ok_or("FEN missing en-passant field")?;
        // Clock fields are optional in relaxed FEN.
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        *self = Board::new_empty();

        // Placement: ranks 8 down to 1, '/'-separated.
        let mut rank: i32 = 7;
        let mut file: i32 = 0;
        for ch in placement.chars() {
            match ch {
                '/' => {
                    if file != 8 {
                        return Err(format!("rank {} has {} files", rank + 1, file));
                    }
                    rank -= 1;
                    file = 0;
                    if rank < 0 {
                        return Err("too many ranks in FEN".into());
                    }
                }
                '1'..='8' => {
                    file += ch as i32 - '0' as i32;
                    if file > 8 {
                        return Err(format!("rank {} overflows", rank + 1));
                    }
                }
                _ => {
                    let (piece, color) = if ch.is_ascii() {
                        CHAR_TO_PC[ch as usize].ok_or_else(|| format!("bad FEN glyph {:?}", ch))?
                    } else {
                        return Err(format!("bad FEN glyph {:?}", ch));
                    };
                    if file > 7 {
                        return Err(format!("rank {} overflows", rank + 1));
                    }
                    let sq = Square::from_coords(file as u8, rank as u8);
                    let bb = self.bb(color, piece) | sq.bb();
                    self.set_bb(color, piece, bb);
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err("FEN placement does not cover 8 ranks".into());
        }

        self.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(format!("bad side-to-move field {:?}", side)),
        };

        self.castling_rights = 0;
        if castling != "-" {
            for ch in castling.chars() {
                self.castling_rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(format!("bad castling field {:?}", castling)),
                };
            }
        }

        self.en_passant = if ep == "-" {
            None
        } else {
            let sq: Square = ep.parse()?;
            if sq.rank() != 2 && sq.rank() != 5 {
                return Err(format!("en-passant square {} on impossible rank", sq));
            }
            Some(sq)
        };

        self.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("bad halfmove clock {:?}", halfmove))?;
        self.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("bad fullmove number {:?}", fullmove))?;

        for &color in &[Color::White, Color::Black] {
            if self.bb(color, Piece::King).count_ones() != 1 {
                return Err(format!("{:?} must have exactly one king", color));
            }
        }

        self.refresh_zobrist();
        self.history.clear();
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty_run = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::from_coords(file, rank)) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            out.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        out.push(glyph_for(piece, color));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                out.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 {
                out.push('K');
            }
            if self.castling_rights & CASTLE_WQ != 0 {
                out.push('Q');
            }
            if self.castling_rights & CASTLE_BK != 0 {
                out.push('k');
            }
            if self.castling_rights & CASTLE_BQ != 0 {
                out.push('q');
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}
