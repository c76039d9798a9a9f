// src/models/model.rs
use super::cev::Cev;
use super::gbm::Gbm;
use serde::Deserialize;

/// One-factor SDE `dX = a(X) dt + b(X) dW` over a fixed horizon.
///
/// Coefficients are time-homogeneous; schemes pass the mesh time along but
/// no model in this crate reads it.
pub trait SDEModel {
    fn drift(&self, x: f64) -> f64;
    fn diffusion(&self, x: f64) -> f64;
    fn diffusion_derivative(&self, x: f64) -> f64;
    fn initial_value(&self) -> f64;
    fn expiry(&self) -> f64;

    /// Drift with the `b·b'` bias term removed, weighted by `blend`.
    fn drift_corrected(&self, x: f64, blend: f64) -> f64 {
        self.drift(x) - blend * self.diffusion(x) * self.diffusion_derivative(x)
    }
}

/// Market inputs shared by every process variant.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ProcessParams {
    pub rate: f64,       // Risk-free rate
    pub volatility: f64, // Constant volatility
    pub carry: f64,      // Continuous dividend yield / cost of carry
    pub spot: f64,       // Initial value of the underlying
    pub expiry: f64,     // Time horizon in years
}

/// Closed set of process variants the engine can simulate.
#[derive(Clone, Debug)]
pub enum Process {
    Gbm(Gbm),
    Cev(Cev),
}

impl Process {
    pub fn name(&self) -> &'static str {
        match self {
            Process::Gbm(_) => "GBM",
            Process::Cev(_) => "CEV",
        }
    }
}

impl From<Gbm> for Process {
    fn from(model: Gbm) -> Self {
        Process::Gbm(model)
    }
}

impl From<Cev> for Process {
    fn from(model: Cev) -> Self {
        Process::Cev(model)
    }
}

impl SDEModel for Process {
    #[inline]
    fn drift(&self, x: f64) -> f64 {
        match self {
            Process::Gbm(m) => m.drift(x),
            Process::Cev(m) => m.drift(x),
        }
    }

    #[inline]
    fn diffusion(&self, x: f64) -> f64 {
        match self {
            Process::Gbm(m) => m.diffusion(x),
            Process::Cev(m) => m.diffusion(x),
        }
    }

    #[inline]
    fn diffusion_derivative(&self, x: f64) -> f64 {
        match self {
            Process::Gbm(m) => m.diffusion_derivative(x),
            Process::Cev(m) => m.diffusion_derivative(x),
        }
    }

    #[inline]
    fn initial_value(&self) -> f64 {
        match self {
            Process::Gbm(m) => m.initial_value(),
            Process::Cev(m) => m.initial_value(),
        }
    }

    #[inline]
    fn expiry(&self) -> f64 {
        match self {
            Process::Gbm(m) => m.expiry(),
            Process::Cev(m) => m.expiry(),
        }
    }
}
