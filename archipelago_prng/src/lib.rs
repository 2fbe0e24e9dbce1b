// Seeded pseudo-random source for the archipelago generator.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. Hand-rolled so the generator output is identical on every
// platform and toolchain; nothing in the workspace reads ambient randomness.
//
// A generation run owns exactly one `GenRng`, created from the run seed and
// passed by `&mut` to every interpreter that needs jitter (plant rolls, kelp
// widths, coral spins). Runs that execute in parallel never share a
// generator: each derives its own with `GenRng::derive(seed, stream)`, so the
// output of instance N does not depend on which thread got there first.
//
// **Critical constraint: determinism.** The integer core must stay free of
// floating point. Float helpers only scale integer output.

use serde::{Deserialize, Serialize};

/// xoshiro256++ state. Cloning a `GenRng` forks an identical stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenRng {
    s: [u64; 4],
}

impl GenRng {
    /// Seed a generator. Equal seeds yield equal sequences.
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

    /// Seed an independent generator for instance `stream` of a run seeded
    /// with `seed`. Used to hand each parallel sub-run its own sequence.
    pub fn derive(seed: u64, stream: u64) -> Self {
        let mut sm = seed ^ stream.wrapping_mul(0xd1b5_4a32_d192_ed03);
        // Burn one output so adjacent streams do not start correlated.
        splitmix64(&mut sm);
        Self::new(splitmix64(&mut sm))
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

    /// Upper 32 bits of the next output.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform `f32` in [0, 1) from the top 24 bits.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform `f64` in [0, 1) from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        assert!(low < high, "range_f32: low must be less than high");
        low + self.next_f32() * (high - low)
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo
    /// bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// `true` with probability `p`. `p <= 0` never fires, `p >= 1` always
    /// does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// `value` or `-value` with equal probability.
    pub fn random_sign(&mut self, value: f32) -> f32 {
        if self.random_bool(0.5) { -value } else { value }
    }

    /// Pass count for a grammar run that expands `base` times plus a random
    /// extra of up to `spread`: `base + ceil(spread * r)` for `r` in [0, 1).
    ///
    /// Equivalent to counting the iterations of
    /// `for i in 0.. while i < base + spread * r`.
    pub fn pass_count(&mut self, base: u32, spread: u32) -> u32 {
        let extra = (spread as f64 * self.next_f64()).ceil() as u32;
        base + extra
    }
}

/// SplitMix64 step, used only to expand seeds.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
