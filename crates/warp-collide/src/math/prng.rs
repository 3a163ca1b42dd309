// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// Seeded `xoroshiro128+` generator for reproducible proxy workloads.
///
/// Drives randomized tree and broad-phase scenarios in tests and benches so a
/// given seed always builds the same scene. Not cryptographically secure.
#[derive(Debug, Clone, Copy)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    const FALLBACK_STATE: u64 = 0x9e37_79b9_7f4a_7c15;

    /// Expands a single 64-bit seed into generator state via SplitMix64.
    pub fn from_seed(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm = seed;
        let mut state = [splitmix64(&mut sm), splitmix64(&mut sm)];
        if state == [0, 0] {
            state[0] = Self::FALLBACK_STATE;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Next float in `[0, 1)`, built from the top 23 bits of the output.
    pub fn next_f32(&mut self) -> f32 {
        let raw = self.next_u64();
        #[allow(clippy::cast_possible_truncation)]
        let bits = ((raw >> 41) as u32) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }

    /// Next float in `[lo, hi)`.
    pub fn next_range(&mut self, lo: f32, hi: f32) -> f32 {
        debug_assert!(lo <= hi, "invalid range: {lo}..{hi}");
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform index in `0..len` using rejection sampling; `0` when `len` is 0.
    pub fn next_index(&mut self, len: usize) -> usize {
        let Ok(span) = u64::try_from(len) else {
            return 0;
        };
        if span <= 1 {
            return 0;
        }
        let bound = u64::MAX - u64::MAX % span;
        loop {
            let candidate = self.next_u64();
            if candidate < bound {
                return usize::try_from(candidate % span).unwrap_or(0);
            }
        }
    }
}
