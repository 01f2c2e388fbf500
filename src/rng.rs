//! Randomness for tile placement.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::num::NonZeroU32;

/// Uniform integers in `[0, bound)`.
pub trait RandomSource {
    fn uniform_int(&mut self, bound: NonZeroU32) -> u32;
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn uniform_int(&mut self, bound: NonZeroU32) -> u32 {
        (**self).uniform_int(bound)
    }
}

/// Turns a full-range `u32` generator into uniform bounded draws by discarding
/// draws at or above the largest multiple of `bound` that fits in the range.
#[derive(Debug, Clone)]
pub struct RejectionSampler<R> {
    rng: R,
}

impl<R: RngCore> RejectionSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> RandomSource for RejectionSampler<R> {
    fn uniform_int(&mut self, bound: NonZeroU32) -> u32 {
        const RANGE: u64 = 1 << 32;
        let bound = u64::from(bound.get());
        let limit = RANGE - RANGE % bound;
        loop {
            let draw = u64::from(self.rng.next_u32());
            if draw < limit {
                return (draw % bound) as u32;
            }
        }
    }
}

/// Deterministic source: the same seed deals the same game.
pub fn seeded(seed: u64) -> RejectionSampler<StdRng> {
    RejectionSampler::new(StdRng::seed_from_u64(seed))
}

/// Source seeded from the operating system.
pub fn from_os() -> RejectionSampler<StdRng> {
    RejectionSampler::new(StdRng::from_os_rng())
}

/// Replays a fixed list of draws (reduced modulo the bound), cycling when exhausted.
/// For tests and scripted demos.
#[derive(Debug, Clone)]
pub struct Scripted {
    draws: Vec<u32>,
    next: usize,
}

impl Scripted {
    pub fn new(draws: &[u32]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for Scripted {
    fn uniform_int(&mut self, bound: NonZeroU32) -> u32 {
        let draw = self.draws.get(self.next % self.draws.len().max(1)).copied().unwrap_or(0);
        self.next += 1;
        draw % bound.get()
    }
}
