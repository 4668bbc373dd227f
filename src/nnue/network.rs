//! NNUE weight store and binary file format.
//!
//! File layout (all values little-endian i16):
//!   1. feature transformer weights  [INPUT_BUCKETS][INPUT_SIZE][HIDDEN_SIZE]
//!   2. feature transformer biases   [HIDDEN_SIZE]
//!   3. output weights               [OUTPUT_BUCKETS][2 * HIDDEN_SIZE]
//!   4. output biases                [OUTPUT_BUCKETS]
//!   5. 48-byte trailer, ignored
//! The file size must match exactly or the load fails.

use super::{HIDDEN_SIZE, INPUT_BUCKETS, INPUT_SIZE, OUTPUT_BUCKETS};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const TRAILER_BYTES: u64 = 48;

pub struct NnueNetwork {
    /// Flat [bucket][input][hidden]; index with `ft_column`.
    ft_weights: Box<[i16]>,
    ft_biases: Box<[i16]>,
    /// Flat [bucket][2 * hidden]; "us" weights then "them" weights.
    output_weights: Box<[i16]>,
    output_biases: Box<[i16]>,
}

fn read_i16s<R: Read>(reader: &mut R, count: usize) -> io::Result<Box<[i16]>> {
    let mut bytes = vec![0u8; count * 2];
    reader.read_exact(&mut bytes)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}

fn write_i16s<W: Write>(writer: &mut W, values: &[i16]) -> io::Result<()> {
    for &v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

impl NnueNetwork {
    pub const FT_WEIGHT_COUNT: usize = INPUT_BUCKETS * INPUT_SIZE * HIDDEN_SIZE;
    pub const OUTPUT_WEIGHT_COUNT: usize = OUTPUT_BUCKETS * 2 * HIDDEN_SIZE;

    /// Exact byte size a valid weight file must have.
    pub fn expected_file_size() -> u64 {
        let data = (Self::FT_WEIGHT_COUNT + HIDDEN_SIZE + Self::OUTPUT_WEIGHT_COUNT
            + OUTPUT_BUCKETS) as u64
            * 2;
        data + TRAILER_BYTES
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let actual = std::fs::metadata(path)?.len();
        let expected = Self::expected_file_size();
        if actual != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("weight file is {} bytes, expected {}", actual, expected),
            ));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let ft_weights = read_i16s(&mut reader, Self::FT_WEIGHT_COUNT)?;
        let ft_biases = read_i16s(&mut reader, HIDDEN_SIZE)?;
        let output_weights = read_i16s(&mut reader, Self::OUTPUT_WEIGHT_COUNT)?;
        let output_biases = read_i16s(&mut reader, OUTPUT_BUCKETS)?;
        // trailer ignored

        Ok(Self {
            ft_weights,
            ft_biases,
            output_weights,
            output_biases,
        })
    }

    /// Write the network in the same layout `load` expects, trailer included.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_i16s(&mut writer, &self.ft_weights)?;
        write_i16s(&mut writer, &self.ft_biases)?;
        write_i16s(&mut writer, &self.output_weights)?;
        write_i16s(&mut writer, &self.output_biases)?;
        writer.write_all(&[0u8; TRAILER_BYTES as usize])?;
        writer.flush()
    }

    /// Assemble a network from raw sections; sizes are checked.
    pub fn from_parts(
        ft_weights: Box<[i16]>,
        ft_biases: Box<[i16]>,
        output_weights: Box<[i16]>,
        output_biases: Box<[i16]>,
    ) -> Self {
        assert_eq!(ft_weights.len(), Self::FT_WEIGHT_COUNT);
        assert_eq!(ft_biases.len(), HIDDEN_SIZE);
        assert_eq!(output_weights.len(), Self::OUTPUT_WEIGHT_COUNT);
        assert_eq!(output_biases.len(), OUTPUT_BUCKETS);
        Self {
            ft_weights,
            ft_biases,
            output_weights,
            output_biases,
        }
    }

    /// Feature transformer column for a global feature index
    /// (bucket * INPUT_SIZE + input).
    #[inline(always)]
    pub fn ft_column(&self, feature: usize) -> &[i16] {
        &self.ft_weights[feature * HIDDEN_SIZE..(feature + 1) * HIDDEN_SIZE]
    }

    #[inline(always)]
    pub fn ft_biases(&self) -> &[i16] {
        &self.ft_biases
    }

    /// `2 * HIDDEN_SIZE` weights for one output bucket: us-half then them-half.
    #[inline(always)]
    pub fn output_weights(&self, bucket: usize) -> &[i16] {
        &self.output_weights[bucket * 2 * HIDDEN_SIZE..(bucket + 1) * 2 * HIDDEN_SIZE]
    }

    #[inline(always)]
    pub fn output_bias(&self, bucket: usize) -> i16 {
        self.output_biases[bucket]
    }
}
