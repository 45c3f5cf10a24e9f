//! A 48 bit linear congruential generator, the `drand48` family.
//!
//! The whole state is three 16 bit words, so every sampler thread can own one outright and reset
//! it from a seed it was handed.

use rand_core::{impls, Error, RngCore, SeedableRng};

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const INCREMENT: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// `X(n+1) = (a * X(n) + c) mod 2^48`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rand48 {
    state: u64
}

impl Rand48 {

    /// Construct a generator from its three state words, least significant first
    pub fn from_words(words: [u16; 3]) -> Rand48 {
        let state = (words[2] as u64) << 32 | (words[1] as u64) << 16 | words[0] as u64;
        Rand48 { state }
    }

    /// The current state words, least significant first
    pub fn words(&self) -> [u16; 3] {
        [self.state as u16, (self.state >> 16) as u16, (self.state >> 32) as u16]
    }

    /// Reset the state to the given words
    pub fn set_seed(&mut self, s0: u16, s1: u16, s2: u16) {
        *self = Rand48::from_words([s0, s1, s2]);
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = MULTIPLIER.wrapping_mul(self.state).wrapping_add(INCREMENT) & MASK;
        self.state
    }

    /// A uniform draw from `[0, 1)` using all 48 bits of one step
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / (1u64 << 48) as f64
    }
}

impl RngCore for Rand48 {

    /// The high 32 bits of one step
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 16) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Rand48 {

    /// The state words as little-endian bytes
    type Seed = [u8; 6];

    fn from_seed(seed: Self::Seed) -> Self {
        let word = |i: usize| u16::from_le_bytes([seed[2 * i], seed[2 * i + 1]]);
        Rand48::from_words([word(0), word(1), word(2)])
    }
}
