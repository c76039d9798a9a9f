// src/solvers/predictor_corrector.rs
//! Modified Predictor-Corrector Scheme
//!
//! # Algorithm
//!
//! For SDE: `dX_t = a(X_t) dt + b(X_t) dW_t`
//!
//! 1. **Predictor step** (Euler):
//!    ```text
//!    X̂ = X_n + a(X_n) Δt + b(X_n) √Δt Z
//!    ```
//!
//! 2. **Corrector step** (weighted trapezoid with corrected drift):
//!    ```text
//!    ã(x)    = a(x) - B b(x) b'(x)
//!    X_{n+1} = X_n + [A ã(X̂) + (1-A) ã(X_n)] Δt
//!                  + [B b(X̂) + (1-B) b(X_n)] √Δt Z
//!    ```
//!
//! `A` weights the drift and `B` the diffusion; `A = B = 0` reduces to
//! Euler, `A = B = ½` is the usual Heun-type corrector with the Itô
//! correction built into `ã`. The same normal draw feeds both stages.

use super::euler_maruyama::EulerMaruyama;
use super::FdmScheme;
use crate::error::{validation::*, SdeResult};
use crate::models::model::SDEModel;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifiedPredictorCorrector {
    a: f64,
    b: f64,
    predictor: f64,
}

impl ModifiedPredictorCorrector {
    pub fn new(a: f64, b: f64) -> SdeResult<Self> {
        validate_finite("blend_a", a)?;
        validate_finite("blend_b", b)?;
        Ok(ModifiedPredictorCorrector {
            a,
            b,
            predictor: 0.0,
        })
    }

    pub fn drift_blend(&self) -> f64 {
        self.a
    }

    pub fn diffusion_blend(&self) -> f64 {
        self.b
    }

    /// Predictor value computed during the most recent step.
    pub fn last_predictor(&self) -> f64 {
        self.predictor
    }
}

impl FdmScheme for ModifiedPredictorCorrector {
    fn advance<M: SDEModel + ?Sized>(
        &mut self,
        model: &M,
        x: f64,
        _t: f64,
        dt: f64,
        z: f64,
    ) -> f64 {
        self.predictor = EulerMaruyama::step(model, x, dt, z);
        let mid = self.predictor;

        let drift_term = (self.a * model.drift_corrected(mid, self.b)
            + (1.0 - self.a) * model.drift_corrected(x, self.b))
            * dt;
        let diffusion_term =
            (self.b * model.diffusion(mid) + (1.0 - self.b) * model.diffusion(x)) * dt.sqrt() * z;

        x + drift_term + diffusion_term
    }
}
