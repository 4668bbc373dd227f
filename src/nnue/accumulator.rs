//! Two-perspective accumulators with incremental updates.
//!
//! The search keeps a stack of accumulators, one entry per ply. A make pushes
//! either an incrementally updated copy of the top entry or, when the move
//! changes a king bucket or a piece identity (king moves, castling,
//! promotions), a dirty entry that the next evaluation refreshes from the
//! board. An unmake pops, restoring the previous entry exactly.

use super::network::NnueNetwork;
use super::{HIDDEN_SIZE, INPUT_BUCKET_MAP, INPUT_SIZE, OUTPUT_BUCKETS, QA, QB, SCALE};
use crate::board::{Board, COLORS, Color, PIECES, Piece};
use crate::moves::types::Move;
use crate::square::Square;
use crate::utils::pop_lsb;

#[derive(Clone, Copy)]
struct KingBucket {
    index: usize,
    mirrored: bool,
}

/// Bucket for the friendly king as seen from `perspective`. Black's view
/// flips the board vertically first; either view mirrors horizontally when
/// the king stands on files e-h.
fn king_bucket(king_sq: u8, perspective: Color) -> KingBucket {
    let transformed = match perspective {
        Color::White => king_sq,
        Color::Black => king_sq ^ 56,
    };
    KingBucket {
        index: INPUT_BUCKET_MAP[transformed as usize],
        mirrored: transformed % 8 >= 4,
    }
}

/// Global feature index: bucket-major, then color-relative piece color, then
/// piece type, then the perspective-transformed square.
fn feature_index(
    perspective: Color,
    piece: Piece,
    piece_color: Color,
    sq: u8,
    bucket: KingBucket,
) -> usize {
    const COLOR_STRIDE: usize = 64 * 6;
    const PIECE_STRIDE: usize = 64;

    let (mapped_color, transformed_sq) = match perspective {
        Color::White => (
            piece_color as usize,
            if bucket.mirrored { sq ^ 7 } else { sq },
        ),
        Color::Black => (
            piece_color as usize ^ 1,
            if bucket.mirrored { sq ^ 63 } else { sq ^ 56 },
        ),
    };

    bucket.index * INPUT_SIZE
        + mapped_color * COLOR_STRIDE
        + piece as usize * PIECE_STRIDE
        + transformed_sq as usize
}

/// Output bucket from total piece count, kings included.
#[inline]
pub fn output_bucket(board: &Board) -> usize {
    const DIVISOR: usize = (30 + OUTPUT_BUCKETS - 1) / OUTPUT_BUCKETS;
    let piece_count = board.piece_count() as usize;
    (piece_count.saturating_sub(2) / DIVISOR).min(OUTPUT_BUCKETS - 1)
}

#[derive(Clone, PartialEq, Eq)]
pub struct Accumulator {
    pub white: [i16; HIDDEN_SIZE],
    pub black: [i16; HIDDEN_SIZE],
    /// False for a dirty entry that must be refreshed before use.
    pub computed: bool,
}

impl Accumulator {
    pub fn dirty() -> Self {
        Self {
            white: [0; HIDDEN_SIZE],
            black: [0; HIDDEN_SIZE],
            computed: false,
        }
    }

    #[inline]
    fn add_column(dest: &mut [i16; HIDDEN_SIZE], column: &[i16]) {
        for (d, &w) in dest.iter_mut().zip(column) {
            *d += w;
        }
    }

    #[inline]
    fn sub_column(dest: &mut [i16; HIDDEN_SIZE], column: &[i16]) {
        for (d, &w) in dest.iter_mut().zip(column) {
            *d -= w;
        }
    }

    fn add_piece(
        &mut self,
        net: &NnueNetwork,
        piece: Piece,
        piece_color: Color,
        sq: u8,
        white_bucket: KingBucket,
        black_bucket: KingBucket,
    ) {
        let wf = feature_index(Color::White, piece, piece_color, sq, white_bucket);
        let bf = feature_index(Color::Black, piece, piece_color, sq, black_bucket);
        Self::add_column(&mut self.white, net.ft_column(wf));
        Self::add_column(&mut self.black, net.ft_column(bf));
    }

    fn sub_piece(
        &mut self,
        net: &NnueNetwork,
        piece: Piece,
        piece_color: Color,
        sq: u8,
        white_bucket: KingBucket,
        black_bucket: KingBucket,
    ) {
        let wf = feature_index(Color::White, piece, piece_color, sq, white_bucket);
        let bf = feature_index(Color::Black, piece, piece_color, sq, black_bucket);
        Self::sub_column(&mut self.white, net.ft_column(wf));
        Self::sub_column(&mut self.black, net.ft_column(bf));
    }

    /// Rebuild both perspectives from scratch: biases plus one feature
    /// column per piece on the board. The single refresh path for king
    /// moves, castling, and promotions alike.
    pub fn refresh(&mut self, board: &Board, net: &NnueNetwork) {
        let biases = net.ft_biases();
        self.white.copy_from_slice(biases);
        self.black.copy_from_slice(biases);

        let white_bucket = king_bucket(board.king_square(Color::White).index(), Color::White);
        let black_bucket = king_bucket(board.king_square(Color::Black).index(), Color::Black);

        for &color in &COLORS {
            for &piece in &PIECES {
                let mut bb = board.pieces(piece, color);
                while bb != 0 {
                    let sq = pop_lsb(&mut bb);
                    self.add_piece(net, piece, color, sq, white_bucket, black_bucket);
                }
            }
        }
        self.computed = true;
    }

    /// SCReLU reduction of both perspectives against the output head.
    /// Centipawns from the side to move's point of view.
    pub fn evaluate(&self, board: &Board, net: &NnueNetwork) -> i32 {
        debug_assert!(self.computed, "evaluating a dirty accumulator");

        let bucket = output_bucket(board);
        let weights = net.output_weights(bucket);
        let (us, them) = match board.side_to_move {
            Color::White => (&self.white, &self.black),
            Color::Black => (&self.black, &self.white),
        };

        let mut sum: i64 = 0;
        for (i, &a) in us.iter().enumerate() {
            let clamped = (a as i32).clamp(0, QA) as i64;
            sum += clamped * clamped * weights[i] as i64;
        }
        for (i, &a) in them.iter().enumerate() {
            let clamped = (a as i32).clamp(0, QA) as i64;
            sum += clamped * clamped * weights[HIDDEN_SIZE + i] as i64;
        }

        let mut output = sum / QA as i64;
        output += net.output_bias(bucket) as i64;
        ((output * SCALE as i64) / (QA as i64 * QB as i64)) as i32
    }
}

/// Per-ply accumulator stack owned by a single search.
pub struct NnueStack<'a> {
    net: &'a NnueNetwork,
    stack: Vec<Accumulator>,
}

impl<'a> NnueStack<'a> {
    pub fn new(net: &'a NnueNetwork, board: &Board) -> Self {
        let mut root = Accumulator::dirty();
        root.refresh(board, net);
        Self {
            net,
            stack: vec![root],
        }
    }

    /// Push the accumulator for the position after `mv`. Must be called with
    /// the board still in its pre-move state.
    pub fn push(&mut self, board: &Board, mv: Move) {
        // King-bucket changes and piece-identity changes invalidate the
        // delta form; the replacement entry is rebuilt lazily.
        let needs_refresh = {
            let top = self.stack.last().expect("accumulator stack underflow");
            mv.piece() == Piece::King || mv.is_castling() || mv.is_promotion() || !top.computed
        };
        if needs_refresh {
            self.stack.push(Accumulator::dirty());
            return;
        }

        let mut acc = self
            .stack
            .last()
            .expect("accumulator stack underflow")
            .clone();
        let us = board.side_to_move;
        let white_bucket = king_bucket(board.king_square(Color::White).index(), Color::White);
        let black_bucket = king_bucket(board.king_square(Color::Black).index(), Color::Black);

        acc.sub_piece(
            self.net,
            mv.piece(),
            us,
            mv.from().index(),
            white_bucket,
            black_bucket,
        );
        acc.add_piece(
            self.net,
            mv.piece(),
            us,
            mv.to().index(),
            white_bucket,
            black_bucket,
        );

        if mv.is_capture() {
            let (victim, victim_sq) = if mv.is_en_passant() {
                let sq = match us {
                    Color::White => mv.to().index() - 8,
                    Color::Black => mv.to().index() + 8,
                };
                (Piece::Pawn, Square::from_index(sq))
            } else {
                let victim = board
                    .piece_type_at(mv.to())
                    .expect("capture target is empty");
                (victim, mv.to())
            };
            acc.sub_piece(
                self.net,
                victim,
                us.opposite(),
                victim_sq.index(),
                white_bucket,
                black_bucket,
            );
        }

        self.stack.push(acc);
    }

    /// Drop the top entry; the previous one is byte-identical to what it was
    /// before the matching push.
    pub fn pop(&mut self) {
        self.stack.pop();
        debug_assert!(!self.stack.is_empty(), "popped the root accumulator");
    }

    /// Evaluate the current position, refreshing the top entry if dirty.
    pub fn evaluate(&mut self, board: &Board) -> i32 {
        let net = self.net;
        let top = self.stack.last_mut().expect("accumulator stack underflow");
        if !top.computed {
            top.refresh(board, net);
        }
        top.evaluate(board, net)
    }

    pub fn top(&self) -> &Accumulator {
        self.stack.last().expect("accumulator stack underflow")
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
