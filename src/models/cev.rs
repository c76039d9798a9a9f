// src/models/cev.rs
//! Constant Elasticity of Variance (CEV) process
//!
//! ```text
//! dS_t = (r - q) S_t dt + σ̃ S_t^β dW_t,    σ̃ = σ · S_0^(1-β)
//! ```
//!
//! The volatility is rescaled once at construction so that the local
//! volatility at the initial spot matches `σ`. At `β = 1` the model reduces
//! exactly to geometric Brownian motion.

use super::model::{ProcessParams, SDEModel};
use crate::error::{validation::*, SdeResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Cev {
    pub params: ProcessParams,
    pub beta: f64,
    scaled_vol: f64,
}

impl Cev {
    pub fn new(params: ProcessParams, beta: f64) -> SdeResult<Self> {
        validate_finite("rate", params.rate)?;
        validate_finite("carry", params.carry)?;
        validate_non_negative("volatility", params.volatility)?;
        validate_finite("volatility", params.volatility)?;
        // spot^(1-β) and x^(β-1) both need a strictly positive level
        validate_positive("spot", params.spot)?;
        validate_finite("spot", params.spot)?;
        validate_positive("expiry", params.expiry)?;
        validate_finite("expiry", params.expiry)?;
        validate_finite("beta", beta)?;

        let scaled_vol = params.volatility * params.spot.powf(1.0 - beta);
        Ok(Cev {
            params,
            beta,
            scaled_vol,
        })
    }

    /// Volatility after the `S_0^(1-β)` rescaling.
    pub fn scaled_volatility(&self) -> f64 {
        self.scaled_vol
    }
}

impl SDEModel for Cev {
    fn drift(&self, s: f64) -> f64 {
        (self.params.rate - self.params.carry) * s
    }

    fn diffusion(&self, s: f64) -> f64 {
        self.scaled_vol * s.powf(self.beta)
    }

    fn diffusion_derivative(&self, s: f64) -> f64 {
        if self.beta > 1.0 {
            self.scaled_vol * self.beta * s.powf(self.beta - 1.0)
        } else {
            // keep the exponent non-negative for β ≤ 1
            self.scaled_vol * self.beta / s.powf(1.0 - self.beta)
        }
    }

    fn initial_value(&self) -> f64 {
        self.params.spot
    }

    fn expiry(&self) -> f64 {
        self.params.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gbm::Gbm;
    use approx::assert_relative_eq;

    fn params() -> ProcessParams {
        ProcessParams {
            rate: 0.08,
            volatility: 0.3,
            carry: 0.01,
            spot: 60.0,
            expiry: 0.25,
        }
    }

    #[test]
    fn test_cev_collapses_to_gbm_at_unit_beta() {
        let cev = Cev::new(params(), 1.0).unwrap();
        let gbm = Gbm::new(params()).unwrap();

        assert_eq!(cev.scaled_volatility(), 0.3);
        for &x in &[0.5, 1.0, 30.0, 60.0, 250.0] {
            assert_relative_eq!(cev.drift(x), gbm.drift(x), max_relative = 1e-12);
            assert_relative_eq!(cev.diffusion(x), gbm.diffusion(x), max_relative = 1e-12);
            assert_relative_eq!(
                cev.diffusion_derivative(x),
                gbm.diffusion_derivative(x),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_cev_derivative_branches_agree_near_unit_beta() {
        let above = Cev::new(params(), 1.0 + 1e-9).unwrap();
        let at = Cev::new(params(), 1.0).unwrap();
        let x = 75.0;
        assert_relative_eq!(
            above.diffusion_derivative(x),
            at.diffusion_derivative(x),
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_cev_derivative_matches_finite_difference() {
        for &beta in &[0.5, 0.8, 1.3] {
            let cev = Cev::new(params(), beta).unwrap();
            let x = 55.0;
            let h = 1e-5;
            let fd = (cev.diffusion(x + h) - cev.diffusion(x - h)) / (2.0 * h);
            assert_relative_eq!(cev.diffusion_derivative(x), fd, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_cev_local_vol_matches_at_spot() {
        let cev = Cev::new(params(), 0.5).unwrap();
        // σ̃ S_0^β = σ S_0
        assert_relative_eq!(cev.diffusion(60.0), 0.3 * 60.0, max_relative = 1e-12);
    }

    #[test]
    fn test_cev_rejects_non_positive_spot() {
        let mut p = params();
        p.spot = 0.0;
        assert!(Cev::new(p, 0.5).is_err());
        p.spot = -10.0;
        assert!(Cev::new(p, 0.5).is_err());
    }
}
