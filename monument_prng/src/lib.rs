// Seeded pseudo-random generator for walker decisions.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. The only consumer today is the crow steering in
// `monument_nav::walker`, which picks among a node's unvisited neighbors.
// Keeping the generator in-house means a level replayed with the same seed
// and the same command stream produces the same crow route on every
// platform, which the level scenario tests rely on.
//
// **Critical constraint: determinism.** No floating point in the core
// generator, no OS entropy, no thread-local state.

use serde::{Deserialize, Serialize};

/// xoshiro256++ state. Cloning forks the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkRng {
    s: [u64; 4],
}

impl WalkRng {
    /// Seed a generator. Equal seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform index in `[0, len)` without modulo bias.
    ///
    /// Returns `None` for `len == 0` instead of panicking, so callers can
    /// feed it a possibly empty candidate list directly.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let range = len as u64;
        if range.is_power_of_two() {
            return Some((self.next_u64() & (range - 1)) as usize);
        }
        // (2^64 - range) % range: values below this would bias low indices.
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return Some((r % range) as usize);
            }
        }
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }
}

impl Default for WalkRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// SplitMix64 step, used only to expand the seed.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = WalkRng::new(7);
        let mut b = WalkRng::new(7);
        for _ in 0..500 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = WalkRng::new(7);
        let mut b = WalkRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn index_stays_in_bounds() {
        let mut rng = WalkRng::new(31);
        for len in 1..12 {
            for _ in 0..500 {
                let i = rng.index(len).unwrap();
                assert!(i < len, "index {i} out of range for len {len}");
            }
        }
    }

    #[test]
    fn index_of_empty_is_none() {
        let mut rng = WalkRng::new(1);
        assert_eq!(rng.index(0), None);
        let empty: [u32; 0] = [];
        assert_eq!(rng.choose(&empty), None);
    }

    #[test]
    fn choose_reaches_every_element() {
        let mut rng = WalkRng::new(99);
        let items = ['a', 'b', 'c'];
        let mut seen = [false; 3];
        for _ in 0..200 {
            let c = *rng.choose(&items).unwrap();
            seen[(c as u8 - b'a') as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "not every element was chosen: {seen:?}");
    }

    #[test]
    fn state_survives_serialization() {
        let mut rng = WalkRng::new(42);
        for _ in 0..10 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: WalkRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
