// src/rng/sources.rs
//! Concrete standard-normal generators.
//!
//! # Box-Muller Transform
//!
//! ```text
//! Z = √(-2 ln r) · cos(2π φ),    r, φ ~ Uniform(0,1)
//! ```
//!
//! Only the cosine branch is used; the sine partner is discarded so that
//! each call consumes exactly two uniforms and carries no hidden spare.
//!
//! # Polar Marsaglia
//!
//! ```text
//! V1, V2 ~ Uniform(-1,1),  W = V1² + V2²,  accept 0 < W ≤ 1
//! Z = V1 · √(-2 ln W / W)
//! ```

use super::mt19937::Mt19937_64;
use super::NormalSource;
use crate::error::{validation::*, SdeResult};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Mersenne Twister engine feeding the ziggurat normal sampler.
#[derive(Clone, Debug)]
pub struct MersenneNormal {
    engine: Mt19937_64,
    mean: f64,
    std_dev: f64,
}

impl MersenneNormal {
    pub fn new(seed: u64, mean: f64, variance: f64) -> SdeResult<Self> {
        validate_finite("mean", mean)?;
        validate_non_negative("variance", variance)?;
        validate_finite("variance", variance)?;
        Ok(MersenneNormal {
            engine: Mt19937_64::seed_from_u64(seed),
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Mean 0, variance 1.
    pub fn standard(seed: u64) -> Self {
        MersenneNormal {
            engine: Mt19937_64::seed_from_u64(seed),
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

impl NormalSource for MersenneNormal {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.engine);
        self.mean + self.std_dev * z
    }
}

#[derive(Clone, Debug)]
pub struct BoxMuller {
    engine: StdRng,
}

impl BoxMuller {
    pub fn new(seed: u64) -> Self {
        BoxMuller {
            engine: StdRng::seed_from_u64(seed),
        }
    }
}

impl NormalSource for BoxMuller {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        let r: f64 = self.engine.sample(Open01);
        let phi: f64 = self.engine.sample(Open01);
        (-2.0 * r.ln()).sqrt() * (2.0 * PI * phi).cos()
    }
}

#[derive(Clone, Debug)]
pub struct PolarMarsaglia {
    engine: StdRng,
}

impl PolarMarsaglia {
    pub fn new(seed: u64) -> Self {
        PolarMarsaglia {
            engine: StdRng::seed_from_u64(seed),
        }
    }
}

impl NormalSource for PolarMarsaglia {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        loop {
            let v1: f64 = 2.0 * self.engine.gen::<f64>() - 1.0;
            let v2: f64 = 2.0 * self.engine.gen::<f64>() - 1.0;
            let w = v1 * v1 + v2 * v2;
            // W = 0 would divide by zero inside the log term
            if w > 0.0 && w <= 1.0 {
                return v1 * (-2.0 * w.ln() / w).sqrt();
            }
        }
    }
}
