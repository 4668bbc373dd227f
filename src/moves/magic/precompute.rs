//! Build the magic lookup tables: relevant-occupancy masks, blocker subset
//! enumeration, and a seeded trial-and-verify magic search per square.

use crate::moves::magic::attacks::{get_bishop_attack_bitboards, get_rook_attack_bitboards};
use crate::moves::magic::search::find_magic_number_for_square;
use crate::moves::magic::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[derive(Debug, Clone, Copy)]
pub enum MagicTableSeed {
    Fixed(u64),
    FromEntropy,
}

/// Inner ray squares for a rook: edge squares never change the reachable set.
pub fn rook_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

pub fn bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;

    for (dr, df) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let mut r = rank + dr;
        let mut f = file + df;
        while (1..7).contains(&r) && (1..7).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// All subsets of `mask` via the carry-rippler trick.
pub fn enumerate_blockers(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1usize << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_entry<R: RngCore>(
    mask: u64,
    blockers: &[u64],
    attacks: &[u64],
    rng: &mut R,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let magic = find_magic_number_for_square(blockers, attacks, shift, rng)?;

    let mut table = vec![0u64; 1usize << bits];
    for (&blocker, &attack) in blockers.iter().zip(attacks) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        // The magic search guarantees any collision maps to the same set.
        table[index] = attack;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::FromEntropy => {
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            StdRng::from_seed(bytes)
        }
    };

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let mask = rook_mask(square);
        let blockers = enumerate_blockers(mask);
        let attacks = get_rook_attack_bitboards(square, &blockers);
        rook_entries.push(
            build_entry(mask, &blockers, &attacks, &mut rng)
                .map_err(|e| format!("rook square {}: {}", square, e))?,
        );
    }

    for square in 0..64 {
        let mask = bishop_mask(square);
        let blockers = enumerate_blockers(mask);
        let attacks = get_bishop_attack_bitboards(square, &blockers);
        bishop_entries.push(
            build_entry(mask, &blockers, &attacks, &mut rng)
                .map_err(|e| format!("bishop square {}: {}", square, e))?,
        );
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_excludes_edges_and_self() {
        // a1: vertical ray a2..a7, horizontal b1..g1
        let mask = rook_mask(0);
        assert_eq!(mask.count_ones(), 12);
        assert_eq!(mask & 1, 0);
        // d4: 5 vertical + 5 horizontal inner squares
        assert_eq!(rook_mask(27).count_ones(), 10);
    }

    #[test]
    fn bishop_mask_inner_only() {
        assert_eq!(bishop_mask(0).count_ones(), 6); // a1 long diagonal b2..g7
        assert_eq!(bishop_mask(27).count_ones(), 9); // d4
    }

    #[test]
    fn blocker_enumeration_covers_power_set() {
        let mask = rook_mask(0);
        let subsets = enumerate_blockers(mask);
        assert_eq!(subsets.len(), 1 << mask.count_ones());
        assert!(subsets.iter().all(|&s| s & !mask == 0));
    }
}
