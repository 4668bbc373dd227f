//! NNUE evaluation: a (768 -> 1024)x2 feature transformer with king-bucketed
//! inputs, SCReLU activation, and a piece-count-bucketed output head.

pub mod accumulator;
pub mod network;

pub use accumulator::{Accumulator, NnueStack, output_bucket};
pub use network::NnueNetwork;

/// 64 squares x 6 piece types x 2 colors.
pub const INPUT_SIZE: usize = 768;
/// Hidden neurons per perspective.
pub const HIDDEN_SIZE: usize = 1024;
/// King-position input buckets.
pub const INPUT_BUCKETS: usize = 5;
/// Material-count output buckets.
pub const OUTPUT_BUCKETS: usize = 8;

// Quantization constants; part of the weight-file contract.
pub const QA: i32 = 255;
pub const QB: i32 = 64;
pub const SCALE: i32 = 400;

/// King square (after perspective transform) -> input bucket.
#[rustfmt::skip]
pub const INPUT_BUCKET_MAP: [usize; 64] = [
    0, 0, 1, 1, 1, 1, 0, 0,
    2, 2, 3, 3, 3, 3, 2, 2,
    2, 2, 3, 3, 3, 3, 2, 2,
    4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4,
];
