//! Option Payoff Strategies
//!
//! # Mathematical Definitions
//!
//! The pricers in [`super::pricers`] are assembled from three small,
//! caller-selected strategies:
//!
//! - [`PayoffFn`]: maps a terminal or averaged price to a payoff
//!   - **Call**: max(S - K, 0)
//!   - **Put**: max(K - S, 0)
//! - [`Averaging`]: reduces a path to one price for Asian options
//!   - **Arithmetic**: (1/n) ∑ S_i
//!   - **Geometric**: (∏ S_i)^(1/n)
//! - [`KnockRule`]: decides whether a barrier voids the option on a path
//!
//! All of them operate on the full price path `&[f64]` (index 0 is the
//! initial value) and are pure.

use serde::Deserialize;

/// Payoff as a function of a single price.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoffFn {
    /// max(S - K, 0)
    Call { strike: f64 },

    /// max(K - S, 0)
    Put { strike: f64 },
}

impl PayoffFn {
    #[inline]
    pub fn apply(&self, price: f64) -> f64 {
        match self {
            PayoffFn::Call { strike } => (price - strike).max(0.0),
            PayoffFn::Put { strike } => (strike - price).max(0.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayoffFn::Call { .. } => "Call",
            PayoffFn::Put { .. } => "Put",
        }
    }
}

/// Path averaging used by Asian options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    Arithmetic,
    Geometric,
}

impl Averaging {
    /// Average over every point of the path, including the initial value.
    ///
    /// The geometric mean is computed in log space; it equals
    /// `(∏ S_i)^(1/n)` without overflowing on long paths.
    pub fn apply(&self, path: &[f64]) -> f64 {
        let n = path.len() as f64;
        match self {
            Averaging::Arithmetic => path.iter().sum::<f64>() / n,
            Averaging::Geometric => (path.iter().map(|s| s.ln()).sum::<f64>() / n).exp(),
        }
    }
}

/// Barrier condition evaluated over a whole path.
///
/// A barrier is "touched" when a price is `>= level` (up) or `<= level`
/// (down). `knocked_out` returns `true` when the option pays nothing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnockRule {
    /// Void once any price touches the barrier from below.
    UpAndOut { barrier: f64 },

    /// Live only if some price touches the barrier from below.
    UpAndIn { barrier: f64 },

    /// Void once any price touches the barrier from above.
    DownAndOut { barrier: f64 },

    /// Live only if some price touches the barrier from above.
    DownAndIn { barrier: f64 },
}

impl KnockRule {
    pub fn knocked_out(&self, path: &[f64]) -> bool {
        match *self {
            KnockRule::UpAndOut { barrier } => path.iter().any(|&s| s >= barrier),
            KnockRule::UpAndIn { barrier } => !path.iter().any(|&s| s >= barrier),
            KnockRule::DownAndOut { barrier } => path.iter().any(|&s| s <= barrier),
            KnockRule::DownAndIn { barrier } => !path.iter().any(|&s| s <= barrier),
        }
    }

    pub fn barrier(&self) -> f64 {
        match *self {
            KnockRule::UpAndOut { barrier }
            | KnockRule::UpAndIn { barrier }
            | KnockRule::DownAndOut { barrier }
            | KnockRule::DownAndIn { barrier } => barrier,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KnockRule::UpAndOut { .. } => "Up-And-Out",
            KnockRule::UpAndIn { .. } => "Up-And-In",
            KnockRule::DownAndOut { .. } => "Down-And-Out",
            KnockRule::DownAndIn { .. } => "Down-And-In",
        }
    }
}
