// src/rng/mt19937.rs
//! 64-bit Mersenne Twister (MT19937-64).
//!
//! Seeding via [`SeedableRng::seed_from_u64`] follows the reference
//! `init_genrand64`, so a given `u64` seed reproduces the same stream as
//! other MT19937-64 implementations (including `std::mt19937_64`).

use rand::{Error, RngCore, SeedableRng};

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000; // most significant 33 bits
const LOWER_MASK: u64 = 0x0000_0000_7FFF_FFFF; // least significant 31 bits

/// Default seed of the reference implementation.
pub const DEFAULT_SEED: u64 = 5489;

#[derive(Clone)]
pub struct Mt19937_64 {
    state: Box<[u64; NN]>,
    index: usize,
}

impl std::fmt::Debug for Mt19937_64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937_64")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Mt19937_64 {
    pub fn new(seed: u64) -> Self {
        let mut state = Box::new([0u64; NN]);
        state[0] = seed;
        for i in 1..NN {
            state[i] = 6_364_136_223_846_793_005u64
                .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 62))
                .wrapping_add(i as u64);
        }
        Mt19937_64 { state, index: NN }
    }

    fn twist(&mut self) {
        let mt = &mut self.state;
        let mag01 = |x: u64| if x & 1 == 0 { 0 } else { MATRIX_A };

        for i in 0..NN - MM {
            let x = (mt[i] & UPPER_MASK) | (mt[i + 1] & LOWER_MASK);
            mt[i] = mt[i + MM] ^ (x >> 1) ^ mag01(x);
        }
        for i in NN - MM..NN - 1 {
            let x = (mt[i] & UPPER_MASK) | (mt[i + 1] & LOWER_MASK);
            mt[i] = mt[i + MM - NN] ^ (x >> 1) ^ mag01(x);
        }
        let x = (mt[NN - 1] & UPPER_MASK) | (mt[0] & LOWER_MASK);
        mt[NN - 1] = mt[MM - 1] ^ (x >> 1) ^ mag01(x);

        self.index = 0;
    }
}

impl Default for Mt19937_64 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Mt19937_64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.index >= NN {
            self.twist();
        }

        let mut x = self.state[self.index];
        self.index += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^= x >> 43;
        x
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mt19937_64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
