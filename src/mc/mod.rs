//! Monte Carlo pricing: payoff strategies, path-observing pricers and the
//! engine that drives them.

pub mod engine;
pub mod payoffs;
pub mod pricers;

pub use engine::{EngineState, MonteCarloEngine, SubscriberId};
pub use payoffs::{Averaging, KnockRule, PayoffFn};
pub use pricers::{discount_factor, PathObserver, PathStatistics, Pricer, PricingSummary};
