// src/rng/mod.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! 1. **Reproducibility**: Same seed → same stream
//! 2. **Exclusive ownership**: a source is a plain owned value with a single
//!    `next_standard_normal()` method; it is never shared between workers
//! 3. **Parallel safety**: worker streams are derived from the base seed
//!    through a splitmix64 mixer, so each worker gets an independent source
//!
//! Three generators are provided, see [`sources`].

pub mod mt19937;
pub mod sources;

pub use mt19937::Mt19937_64;
pub use sources::{BoxMuller, MersenneNormal, PolarMarsaglia};

use crate::error::SdeResult;

/// Infinite, non-restartable stream of normal variates.
pub trait NormalSource {
    fn next_standard_normal(&mut self) -> f64;
}

/// Variant tag plus distribution parameters; enough to rebuild a source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceKind {
    MersenneNormal { mean: f64, variance: f64 },
    BoxMuller,
    PolarMarsaglia,
}

impl SourceKind {
    pub const STANDARD_MERSENNE: SourceKind = SourceKind::MersenneNormal {
        mean: 0.0,
        variance: 1.0,
    };

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::MersenneNormal { .. } => "MersenneNormal",
            SourceKind::BoxMuller => "BoxMuller",
            SourceKind::PolarMarsaglia => "PolarMarsaglia",
        }
    }
}

#[derive(Debug)]
enum Generator {
    Mersenne(MersenneNormal),
    BoxMuller(BoxMuller),
    Polar(PolarMarsaglia),
}

/// Seeded source of normal variates used by the simulation engine.
///
/// Deliberately not `Clone`: duplicating a source would replay its stream.
/// Use [`RandomSource::spawn`] to obtain an independent stream.
#[derive(Debug)]
pub struct RandomSource {
    kind: SourceKind,
    seed: u64,
    generator: Generator,
}

impl RandomSource {
    pub fn new(kind: SourceKind, seed: u64) -> SdeResult<Self> {
        let generator = match kind {
            SourceKind::MersenneNormal { mean, variance } => {
                Generator::Mersenne(MersenneNormal::new(seed, mean, variance)?)
            }
            SourceKind::BoxMuller => Generator::BoxMuller(BoxMuller::new(seed)),
            SourceKind::PolarMarsaglia => Generator::Polar(PolarMarsaglia::new(seed)),
        };
        Ok(RandomSource {
            kind,
            seed,
            generator,
        })
    }

    pub fn mersenne_normal(seed: u64) -> Self {
        RandomSource {
            kind: SourceKind::STANDARD_MERSENNE,
            seed,
            generator: Generator::Mersenne(MersenneNormal::standard(seed)),
        }
    }

    pub fn box_muller(seed: u64) -> Self {
        RandomSource {
            kind: SourceKind::BoxMuller,
            seed,
            generator: Generator::BoxMuller(BoxMuller::new(seed)),
        }
    }

    pub fn polar_marsaglia(seed: u64) -> Self {
        RandomSource {
            kind: SourceKind::PolarMarsaglia,
            seed,
            generator: Generator::Polar(PolarMarsaglia::new(seed)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fresh source of the same kind on stream `stream_id`, seeded
    /// independently of this one.
    pub fn spawn(&self, stream_id: u64) -> SdeResult<Self> {
        RandomSource::new(self.kind, derive_seed(self.seed, stream_id))
    }
}

impl NormalSource for RandomSource {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        match &mut self.generator {
            Generator::Mersenne(g) => g.next_standard_normal(),
            Generator::BoxMuller(g) => g.next_standard_normal(),
            Generator::Polar(g) => g.next_standard_normal(),
        }
    }
}

impl<S: NormalSource + ?Sized> NormalSource for &mut S {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        (**self).next_standard_normal()
    }
}

/// Splitmix64-style mixing of `(base_seed, stream_id)`
///
/// ```text
/// z = base_seed + stream_id + 1
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
pub fn derive_seed(base_seed: u64, stream_id: u64) -> u64 {
    let mut z = base_seed.wrapping_add(stream_id).wrapping_add(1);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}
