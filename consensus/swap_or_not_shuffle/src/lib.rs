//! The "swap-or-not" shuffle (ETH2 `compute_shuffled_index`), seeded by a 32-byte domain-separated
//! digest and iterated for a fixed number of rounds (90 on mainnet).
//!
//! `compute_shuffled_index` answers "where does index `i` land?" in `O(rounds)` without
//! materializing the permutation, which is what proposer-index selection needs (it only ever
//! asks about one candidate at a time). `shuffle_list` answers the same question for every index
//! at once, in `O(n * rounds)`, which is what the per-epoch committee cache needs: the whole
//! shuffle is computed once per seed and then sliced into committees.

use eth2_hashing::hash;

const SEED_SIZE: usize = 32;
const ROUND_SIZE: usize = 1;
const POSITION_WINDOW_SIZE: usize = 4;
const PIVOT_VIEW_SIZE: usize = SEED_SIZE + ROUND_SIZE;
const TOTAL_SIZE: usize = SEED_SIZE + ROUND_SIZE + POSITION_WINDOW_SIZE;

/// Shuffles every index of `0..list_size` under `seed`, returning `shuffled[i]` = the index that
/// position `i` maps to. `forwards` selects the permutation direction: `true` matches the phase-0
/// `compute_shuffled_index` algorithm, `false` computes its inverse ("unshuffle").
pub fn shuffle_list(
    list_size: usize,
    seed: &[u8; 32],
    rounds: u8,
    forwards: bool,
) -> Option<Vec<usize>> {
    if list_size == 0 {
        return Some(vec![]);
    }

    (0..list_size)
        .map(|i| compute_shuffled_index(i, list_size, seed, rounds, forwards))
        .collect()
}

/// Returns the position that `index` is permuted to by `rounds` swap-or-not rounds seeded by
/// `seed`, or `None` if `index >= list_size`.
pub fn compute_shuffled_index(
    index: usize,
    list_size: usize,
    seed: &[u8; 32],
    rounds: u8,
    forwards: bool,
) -> Option<usize> {
    if index >= list_size || list_size == 0 || rounds == 0 {
        return (index < list_size).then(|| index);
    }

    let mut index = index;

    let round_iter: Box<dyn Iterator<Item = u8>> = if forwards {
        Box::new(0..rounds)
    } else {
        Box::new((0..rounds).rev())
    };

    for round in round_iter {
        let pivot = {
            let mut buf = [0u8; PIVOT_VIEW_SIZE];
            buf[0..SEED_SIZE].copy_from_slice(seed);
            buf[SEED_SIZE] = round;
            (bytes_to_u64(&hash(&buf)[0..8]) as usize) % list_size
        };

        let flip = (pivot + list_size - index) % list_size;
        let position = std::cmp::max(index, flip);

        let source = {
            let mut buf = [0u8; TOTAL_SIZE];
            buf[0..SEED_SIZE].copy_from_slice(seed);
            buf[SEED_SIZE] = round;
            buf[PIVOT_VIEW_SIZE..TOTAL_SIZE]
                .copy_from_slice(&((position >> 8) as u32).to_le_bytes());
            hash(&buf)
        };

        let byte = source[(position % 256) / 8];
        let bit = (byte >> (position % 8)) & 1;

        index = if bit == 1 { flip } else { index };
    }

    Some(index)
}

fn bytes_to_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(bytes);
    u64::from_le_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_shuffles_to_empty() {
        let seed = [0u8; 32];
        assert_eq!(shuffle_list(0, &seed, 90, true), Some(vec![]));
    }

    #[test]
    fn out_of_range_index_is_none() {
        let seed = [1u8; 32];
        assert_eq!(compute_shuffled_index(10, 10, &seed, 90, true), None);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let seed = [7u8; 32];
        let n = 64;
        let shuffled = shuffle_list(n, &seed, 90, true).unwrap();

        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn forwards_and_backwards_are_inverses() {
        let seed = [3u8; 32];
        let n = 32;
        let forwards = shuffle_list(n, &seed, 90, true).unwrap();
        let backwards = shuffle_list(n, &seed, 90, false).unwrap();

        for i in 0..n {
            assert_eq!(backwards[forwards[i]], i);
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let seed = [9u8; 32];
        let a = shuffle_list(16, &seed, 90, true).unwrap();
        let b = shuffle_list(16, &seed, 90, true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = shuffle_list(16, &[1u8; 32], 90, true).unwrap();
        let b = shuffle_list(16, &[2u8; 32], 90, true).unwrap();
        assert_ne!(a, b);
    }
}
