// src/solvers/euler_maruyama.rs
//! Euler-Maruyama
//!
//! ```text
//! X_{n+1} = X_n + a(X_n) Δt + b(X_n) √Δt Z_n,    Z_n ~ N(0,1)
//! ```
//!
//! Strong order 0.5, weak order 1. Also serves as the predictor stage of
//! [`super::ModifiedPredictorCorrector`].

use super::FdmScheme;
use crate::models::model::SDEModel;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerMaruyama;

impl EulerMaruyama {
    pub fn new() -> Self {
        EulerMaruyama {}
    }

    /// One step from `x` with the caller's normal draw.
    #[inline]
    pub fn step<M: SDEModel + ?Sized>(model: &M, x: f64, dt: f64, normal_draw: f64) -> f64 {
        let drift_term = model.drift(x) * dt;
        let diffusion_term = model.diffusion(x) * dt.sqrt() * normal_draw;
        x + drift_term + diffusion_term
    }
}

impl FdmScheme for EulerMaruyama {
    #[inline]
    fn advance<M: SDEModel + ?Sized>(
        &mut self,
        model: &M,
        x: f64,
        _t: f64,
        dt: f64,
        z: f64,
    ) -> f64 {
        Self::step(model, x, dt, z)
    }
}
