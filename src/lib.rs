//! # mc-sde-pricer: Monte Carlo Option Pricing over One-Factor SDEs
//!
//! Simulates paths of a one-factor stochastic process with a finite-difference
//! scheme and prices European, Asian and barrier options on them.
//!
//! ## Key Features
//!
//! - **Processes**: geometric Brownian motion and CEV
//! - **Schemes**: Euler-Maruyama, Milstein and a modified predictor-corrector
//! - **Random sources**: Mersenne Twister normal, Box-Muller, Polar Marsaglia
//! - **Observer pricing**: any number of pricers share one simulated path
//! - **Parallel runs**: rayon workers with independent seeded streams
//!
//! ## Quick Start
//!
//! ```rust
//! use mc_sde_pricer::mc::{MonteCarloEngine, PayoffFn, Pricer, discount_factor};
//! use mc_sde_pricer::models::{Gbm, ProcessParams};
//! use mc_sde_pricer::rng::RandomSource;
//! use mc_sde_pricer::solvers::Discretization;
//!
//! let params = ProcessParams {
//!     rate: 0.08,
//!     volatility: 0.3,
//!     carry: 0.0,
//!     spot: 60.0,
//!     expiry: 0.25,
//! };
//! let scheme = Discretization::euler(Gbm::new(params)?.into(), 50);
//! let mut engine = MonteCarloEngine::new(scheme, RandomSource::mersenne_normal(42), 10_000)?;
//!
//! let df = discount_factor(params.rate, params.expiry);
//! let call = engine.subscribe(Pricer::european(PayoffFn::Call { strike: 65.0 }, df))?;
//! engine.run()?;
//!
//! let summary = engine.subscriber(call).and_then(|p| p.summary()).copied();
//! println!("{:?}", summary);
//! # Ok::<(), mc_sde_pricer::SdeError>(())
//! ```
//!
//! The same setup can be read from TOML with [`config::SimulationConfig`].

pub mod config;
pub mod error;
pub mod mc;
pub mod models;
pub mod rng;
pub mod solvers;

pub use error::{SdeError, SdeResult};
