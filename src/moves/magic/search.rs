use rand::RngCore;

/// Sparse 64-bit candidate: AND of three random draws. Low popcount magics
/// collide far less often in the index hash.
#[inline(always)]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// A candidate is valid when no two blocker subsets that map to the same
/// index carry different attack sets (constructive collisions are fine).
/// `blockers` must enumerate the full subset space, so every index produced
/// by `(b * magic) >> shift` is below `blockers.len()`.
pub fn is_magic_candidate_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let mut seen: Vec<Option<u64>> = vec![None; blockers.len()];

    for (&blocker, &attack) in blockers.iter().zip(attacks) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        match seen[index] {
            None => seen[index] = Some(attack),
            Some(existing) => {
                if existing != attack {
                    return false;
                }
            }
        }
    }
    true
}

pub fn find_magic_number_for_square<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Result<u64, String> {
    for _attempt in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_candidate_valid(blockers, attacks, magic, shift) {
            return Ok(magic);
        }
    }
    Err("no valid magic number found in 1,000,000 attempts".to_string())
}
