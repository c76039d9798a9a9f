// src/models/gbm.rs
use super::model::{ProcessParams, SDEModel};
use crate::error::{validation::*, SdeResult};

/// Geometric Brownian motion: `dS = (r - q) S dt + σ S dW`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gbm {
    pub params: ProcessParams,
}

impl Gbm {
    pub fn new(params: ProcessParams) -> SdeResult<Self> {
        validate_finite("rate", params.rate)?;
        validate_finite("carry", params.carry)?;
        validate_non_negative("volatility", params.volatility)?;
        validate_finite("volatility", params.volatility)?;
        validate_finite("spot", params.spot)?;
        validate_positive("expiry", params.expiry)?;
        validate_finite("expiry", params.expiry)?;
        Ok(Gbm { params })
    }

    pub fn exact_step(&self, s_t: f64, dt: f64, normal_draw: f64) -> f64 {
        let sigma = self.params.volatility;
        let mu = self.params.rate - self.params.carry;
        s_t * ((mu - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * normal_draw).exp()
    }
}

impl SDEModel for Gbm {
    fn drift(&self, s: f64) -> f64 {
        (self.params.rate - self.params.carry) * s
    }

    fn diffusion(&self, s: f64) -> f64 {
        self.params.volatility * s
    }

    fn diffusion_derivative(&self, _s: f64) -> f64 {
        self.params.volatility
    }

    fn initial_value(&self) -> f64 {
        self.params.spot
    }

    fn expiry(&self) -> f64 {
        self.params.expiry
    }
}
