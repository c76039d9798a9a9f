// src/config.rs
//! Simulation configuration.
//!
//! A [`SimulationConfig`] is plain data, normally read from TOML:
//!
//! ```toml
//! steps = 50
//! paths = 200000
//! seed = 42
//!
//! [market]
//! rate = 0.08
//! volatility = 0.3
//! carry = 0.0
//! spot = 60.0
//! expiry = 0.25
//!
//! [process]
//! kind = "cev"
//! beta = 0.5
//!
//! [scheme]
//! kind = "predictor_corrector"
//! drift_blend = 0.5
//! diffusion_blend = 0.5
//!
//! [source]
//! kind = "box_muller"
//!
//! [[instruments]]
//! kind = "barrier"
//! payoff = { type = "call", strike = 65.0 }
//! knock = { type = "up_and_out", barrier = 80.0 }
//! ```
//!
//! [`SimulationConfig::assemble`] turns the variant choices into concrete
//! parts. An unknown `kind` never fails: it falls back to GBM, Euler or a
//! standard Mersenne source and logs a warning.

use crate::error::{validation::*, SdeError, SdeResult};
use crate::mc::engine::MonteCarloEngine;
use crate::mc::payoffs::{Averaging, KnockRule, PayoffFn};
use crate::mc::pricers::{discount_factor, Pricer};
use crate::models::{Cev, Gbm, Process, ProcessParams};
use crate::rng::{RandomSource, SourceKind};
use crate::solvers::Discretization;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_SEED: u64 = 5489;
pub const DEFAULT_BLEND: f64 = 0.5;

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_blend() -> f64 {
    DEFAULT_BLEND
}

fn default_variance() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessChoice {
    #[default]
    Gbm,
    Cev {
        beta: f64,
    },
    #[serde(other)]
    Unrecognized,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemeChoice {
    #[default]
    Euler,
    Milstein,
    PredictorCorrector {
        #[serde(default = "default_blend")]
        drift_blend: f64,
        #[serde(default = "default_blend")]
        diffusion_blend: f64,
    },
    #[serde(other)]
    Unrecognized,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceChoice {
    MersenneNormal {
        #[serde(default)]
        mean: f64,
        #[serde(default = "default_variance")]
        variance: f64,
    },
    BoxMuller,
    PolarMarsaglia,
    #[serde(other)]
    Unrecognized,
}

impl Default for SourceChoice {
    fn default() -> Self {
        SourceChoice::MersenneNormal {
            mean: 0.0,
            variance: 1.0,
        }
    }
}

/// One option to price on the simulated paths.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstrumentSpec {
    European {
        payoff: PayoffFn,
        #[serde(default)]
        label: Option<String>,
    },
    Asian {
        payoff: PayoffFn,
        averaging: Averaging,
        #[serde(default)]
        label: Option<String>,
    },
    Barrier {
        payoff: PayoffFn,
        knock: KnockRule,
        #[serde(default)]
        label: Option<String>,
    },
}

impl InstrumentSpec {
    pub fn to_pricer(&self, discount: f64) -> Pricer {
        let (pricer, label) = match self {
            InstrumentSpec::European { payoff, label } => {
                (Pricer::european(*payoff, discount), label)
            }
            InstrumentSpec::Asian {
                payoff,
                averaging,
                label,
            } => (Pricer::asian(*payoff, *averaging, discount), label),
            InstrumentSpec::Barrier {
                payoff,
                knock,
                label,
            } => (Pricer::barrier(*payoff, *knock, discount), label),
        };
        match label {
            Some(label) => pricer.with_label(label.clone()),
            None => pricer,
        }
    }

    fn validate(&self) -> SdeResult<()> {
        let (payoff, barrier) = match self {
            InstrumentSpec::European { payoff, .. } | InstrumentSpec::Asian { payoff, .. } => {
                (payoff, None)
            }
            InstrumentSpec::Barrier { payoff, knock, .. } => (payoff, Some(knock.barrier())),
        };
        let strike = match *payoff {
            PayoffFn::Call { strike } | PayoffFn::Put { strike } => strike,
        };
        if !(strike.is_finite() && strike >= 0.0) {
            return Err(SdeError::PayoffError {
                payoff_type: self.kind_name().to_string(),
                reason: format!("strike {} must be finite and non-negative", strike),
            });
        }
        if let Some(level) = barrier {
            if !(level.is_finite() && level > 0.0) {
                return Err(SdeError::PayoffError {
                    payoff_type: self.kind_name().to_string(),
                    reason: format!("barrier {} must be finite and positive", level),
                });
            }
        }
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        match self {
            InstrumentSpec::European { .. } => "European",
            InstrumentSpec::Asian { .. } => "Asian",
            InstrumentSpec::Barrier { .. } => "Barrier",
        }
    }
}

/// Everything needed to build and run one simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulationConfig {
    pub market: ProcessParams,
    #[serde(default)]
    pub process: ProcessChoice,
    #[serde(default)]
    pub scheme: SchemeChoice,
    #[serde(default)]
    pub source: SourceChoice,
    /// Number of time intervals (NT); negative values become 0.
    pub steps: i64,
    /// Number of simulated paths (NSim).
    pub paths: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker count for parallel runs; `None` runs on the calling thread and
    /// `Some(0)` uses every available CPU.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub instruments: Vec<InstrumentSpec>,
}

/// The concrete (process, scheme, source) triple.
#[derive(Debug)]
pub struct Parts {
    pub process: Process,
    pub scheme: Discretization,
    pub source: RandomSource,
}

impl SimulationConfig {
    pub fn from_toml_str(text: &str) -> SdeResult<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SdeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SdeError::InvalidConfiguration {
            field: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks numeric inputs before anything is built.
    pub fn validate(&self) -> SdeResult<()> {
        let m = &self.market;
        validate_finite("rate", m.rate)?;
        validate_finite("carry", m.carry)?;
        validate_non_negative("volatility", m.volatility)?;
        validate_finite("volatility", m.volatility)?;
        validate_finite("spot", m.spot)?;
        validate_positive("expiry", m.expiry)?;
        validate_finite("expiry", m.expiry)?;
        validate_paths(self.paths)?;

        for instrument in &self.instruments {
            instrument.validate()?;
        }
        Ok(())
    }

    /// Builds the process, scheme and source. Unrecognised choices fall back
    /// to the defaults with a warning.
    pub fn assemble(&self) -> SdeResult<Parts> {
        let process: Process = match self.process {
            ProcessChoice::Gbm => Gbm::new(self.market)?.into(),
            ProcessChoice::Cev { beta } => Cev::new(self.market, beta)?.into(),
            ProcessChoice::Unrecognized => {
                warn!("unrecognised process kind, falling back to GBM");
                Gbm::new(self.market)?.into()
            }
        };

        let scheme = match self.scheme {
            SchemeChoice::Euler => Discretization::euler(process.clone(), self.steps),
            SchemeChoice::Milstein => Discretization::milstein(process.clone(), self.steps),
            SchemeChoice::PredictorCorrector {
                drift_blend,
                diffusion_blend,
            } => Discretization::predictor_corrector(
                process.clone(),
                self.steps,
                drift_blend,
                diffusion_blend,
            )?,
            SchemeChoice::Unrecognized => {
                warn!("unrecognised scheme kind, falling back to Euler");
                Discretization::euler(process.clone(), self.steps)
            }
        };

        let kind = match self.source {
            SourceChoice::MersenneNormal { mean, variance } => {
                SourceKind::MersenneNormal { mean, variance }
            }
            SourceChoice::BoxMuller => SourceKind::BoxMuller,
            SourceChoice::PolarMarsaglia => SourceKind::PolarMarsaglia,
            SourceChoice::Unrecognized => {
                warn!("unrecognised source kind, falling back to MersenneNormal(0, 1)");
                SourceKind::STANDARD_MERSENNE
            }
        };
        let source = RandomSource::new(kind, self.seed)?;

        Ok(Parts {
            process,
            scheme,
            source,
        })
    }

    /// Resolved worker count: `Some(0)` becomes the number of logical CPUs.
    pub fn worker_count(&self) -> Option<usize> {
        match self.workers {
            Some(0) => Some(num_cpus::get()),
            other => other,
        }
    }

    /// Discount factor `exp(-rate · expiry)` shared by every instrument.
    pub fn discount_factor(&self) -> f64 {
        discount_factor(self.market.rate, self.market.expiry)
    }

    pub fn build_pricers(&self) -> Vec<Pricer> {
        let df = self.discount_factor();
        self.instruments.iter().map(|i| i.to_pricer(df)).collect()
    }

    /// Assembled engine with every instrument subscribed.
    pub fn build_engine(&self) -> SdeResult<MonteCarloEngine> {
        let parts = self.assemble()?;
        let mut engine = MonteCarloEngine::new(parts.scheme, parts.source, self.paths)?;
        for pricer in self.build_pricers() {
            engine.subscribe(pricer)?;
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::SchemeKind;

    const BASE: &str = r#"
        steps = 50
        paths = 1000

        [market]
        rate = 0.08
        volatility = 0.3
        carry = 0.0
        spot = 60.0
        expiry = 0.25
    "#;

    fn with(extra: &str) -> SimulationConfig {
        SimulationConfig::from_toml_str(&format!("{}\n{}", BASE, extra)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = with("");
        assert_eq!(cfg.process, ProcessChoice::Gbm);
        assert_eq!(cfg.scheme, SchemeChoice::Euler);
        assert_eq!(cfg.source, SourceChoice::default());
        assert_eq!(cfg.seed, DEFAULT_SEED);
        assert_eq!(cfg.workers, None);

        let parts = cfg.assemble().unwrap();
        assert_eq!(parts.process.name(), "GBM");
        assert_eq!(parts.scheme.name(), "Euler");
        assert_eq!(parts.source.kind(), SourceKind::STANDARD_MERSENNE);
        assert_eq!(parts.scheme.steps(), 50);
    }

    #[test]
    fn test_explicit_choices() {
        let cfg = with(
            r#"
            [process]
            kind = "cev"
            beta = 0.7

            [scheme]
            kind = "predictor_corrector"
            drift_blend = 0.3

            [source]
            kind = "polar_marsaglia"
            "#,
        );
        let parts = cfg.assemble().unwrap();
        assert_eq!(parts.process.name(), "CEV");
        assert_eq!(parts.source.kind(), SourceKind::PolarMarsaglia);
        match parts.scheme.kind() {
            SchemeKind::PredictorCorrector(pc) => {
                assert_eq!(pc.drift_blend(), 0.3);
                assert_eq!(pc.diffusion_blend(), DEFAULT_BLEND);
            }
            other => panic!("unexpected scheme {:?}", other),
        }
    }

    #[test]
    fn test_unrecognised_choices_fall_back() {
        let cfg = with(
            r#"
            [process]
            kind = "heston"
            kappa = 2.0

            [scheme]
            kind = "runge_kutta"

            [source]
            kind = "sobol"
            "#,
        );
        assert_eq!(cfg.process, ProcessChoice::Unrecognized);

        let parts = cfg.assemble().unwrap();
        assert_eq!(parts.process.name(), "GBM");
        assert_eq!(parts.scheme.name(), "Euler");
        assert_eq!(parts.source.kind(), SourceKind::STANDARD_MERSENNE);
    }

    #[test]
    fn test_negative_steps_accepted() {
        let text = BASE.replace("steps = 50", "steps = -4");
        let cfg = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(cfg.assemble().unwrap().scheme.steps(), 0);
    }

    #[test]
    fn test_zero_workers_means_every_cpu() {
        let workers = |line: &str| {
            SimulationConfig::from_toml_str(&format!("{}\n{}", line, BASE))
                .unwrap()
                .worker_count()
        };
        assert_eq!(workers("workers = 0"), Some(num_cpus::get()));
        assert_eq!(workers("workers = 3"), Some(3));
        assert_eq!(workers(""), None);
    }

    #[test]
    fn test_degenerate_parameters_rejected() {
        let zero_paths = BASE.replace("paths = 1000", "paths = 0");
        assert!(SimulationConfig::from_toml_str(&zero_paths).is_err());

        let zero_expiry = BASE.replace("expiry = 0.25", "expiry = 0.0");
        assert!(SimulationConfig::from_toml_str(&zero_expiry).is_err());

        let negative_vol = BASE.replace("volatility = 0.3", "volatility = -0.3");
        assert!(SimulationConfig::from_toml_str(&negative_vol).is_err());

        let mut cev_zero_spot = with("[process]\nkind = \"cev\"\nbeta = 0.5");
        cev_zero_spot.market.spot = 0.0;
        assert!(cev_zero_spot.assemble().is_err());
    }

    #[test]
    fn test_invalid_instruments_rejected() {
        let bad_strike = format!(
            "{}\n{}\n{}\n{}",
            BASE,
            "[[instruments]]",
            "kind = \"european\"",
            "payoff = { type = \"call\", strike = -1.0 }"
        );
        assert!(matches!(
            SimulationConfig::from_toml_str(&bad_strike),
            Err(SdeError::PayoffError { .. })
        ));

        let bad_barrier = format!(
            "{}\n{}\n{}\n{}\n{}",
            BASE,
            "[[instruments]]",
            "kind = \"barrier\"",
            "payoff = { type = \"put\", strike = 65.0 }",
            "knock = { type = \"down_and_out\", barrier = 0.0 }"
        );
        assert!(SimulationConfig::from_toml_str(&bad_barrier).is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = SimulationConfig::from_toml_str("steps = ").unwrap_err();
        assert!(matches!(err, SdeError::ConfigParse(_)));
    }

    #[test]
    fn test_build_pricers_from_instruments() {
        let cfg = with(
            r#"
            [[instruments]]
            kind = "european"
            payoff = { type = "call", strike = 65.0 }

            [[instruments]]
            kind = "asian"
            payoff = { type = "put", strike = 65.0 }
            averaging = "geometric"
            label = "asian put"

            [[instruments]]
            kind = "barrier"
            payoff = { type = "call", strike = 65.0 }
            knock = { type = "down_and_out", barrier = 50.0 }
            "#,
        );
        let pricers = cfg.build_pricers();
        assert_eq!(pricers.len(), 3);
        assert_eq!(pricers[0].describe(), "European Call");
        assert_eq!(pricers[1].describe(), "asian put");
        assert_eq!(pricers[2].describe(), "Down-And-Out Call");
        for p in &pricers {
            assert_eq!(p.discount_factor(), (-0.08f64 * 0.25).exp());
        }
    }

    #[test]
    fn test_build_engine_runs() {
        let cfg = with(
            r#"
            [[instruments]]
            kind = "european"
            payoff = { type = "call", strike = 65.0 }
            "#,
        );
        let mut engine = cfg.build_engine().unwrap();
        engine.run().unwrap();
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.results()[0].1.paths, 1000);
    }
}
