//! Time-discretisation schemes.
//!
//! A [`Discretization`] owns the process it integrates, the [`TimeMesh`]
//! built from the process expiry, and one of the closed set of schemes in
//! [`SchemeKind`].

pub mod euler_maruyama;
pub mod mesh;
pub mod milstein;
pub mod predictor_corrector;

pub use euler_maruyama::EulerMaruyama;
pub use mesh::TimeMesh;
pub use milstein::Milstein;
pub use predictor_corrector::ModifiedPredictorCorrector;

use crate::error::SdeResult;
use crate::models::model::{Process, SDEModel};
use crate::rng::NormalSource;

/// One step of a finite-difference scheme: `x(t) -> x(t + dt)` given `Z ~ N(0,1)`.
pub trait FdmScheme {
    fn advance<M: SDEModel + ?Sized>(&mut self, model: &M, x: f64, t: f64, dt: f64, z: f64) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SchemeKind {
    Euler(EulerMaruyama),
    Milstein(Milstein),
    PredictorCorrector(ModifiedPredictorCorrector),
}

impl SchemeKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemeKind::Euler(_) => "Euler",
            SchemeKind::Milstein(_) => "Milstein",
            SchemeKind::PredictorCorrector(_) => "ModifiedPredictorCorrector",
        }
    }
}

impl FdmScheme for SchemeKind {
    #[inline]
    fn advance<M: SDEModel + ?Sized>(&mut self, model: &M, x: f64, t: f64, dt: f64, z: f64) -> f64 {
        match self {
            SchemeKind::Euler(s) => s.advance(model, x, t, dt, z),
            SchemeKind::Milstein(s) => s.advance(model, x, t, dt, z),
            SchemeKind::PredictorCorrector(s) => s.advance(model, x, t, dt, z),
        }
    }
}

/// A scheme bound to its process and time mesh for the length of a run.
#[derive(Clone, Debug)]
pub struct Discretization {
    process: Process,
    mesh: TimeMesh,
    kind: SchemeKind,
}

impl Discretization {
    /// Builds the mesh from `process.expiry()`; negative `steps` become 0.
    pub fn new(process: Process, steps: i64, kind: SchemeKind) -> Self {
        let mesh = TimeMesh::new(process.expiry(), steps);
        Discretization {
            process,
            mesh,
            kind,
        }
    }

    pub fn euler(process: Process, steps: i64) -> Self {
        Self::new(process, steps, SchemeKind::Euler(EulerMaruyama::new()))
    }

    pub fn milstein(process: Process, steps: i64) -> Self {
        Self::new(process, steps, SchemeKind::Milstein(Milstein::new()))
    }

    pub fn predictor_corrector(process: Process, steps: i64, a: f64, b: f64) -> SdeResult<Self> {
        let scheme = ModifiedPredictorCorrector::new(a, b)?;
        Ok(Self::new(process, steps, SchemeKind::PredictorCorrector(scheme)))
    }

    #[inline]
    pub fn advance(&mut self, x: f64, t: f64, dt: f64, z: f64) -> f64 {
        self.kind.advance(&self.process, x, t, dt, z)
    }

    /// Fills `path` with one trajectory on the mesh.
    ///
    /// `path[0]` is the initial value and
    /// `path[n] = advance(path[n-1], mesh[n-1], step, z_n)` for `n = 1..=NT`,
    /// drawing one variate per step. `path` must hold `NT + 1` points.
    pub fn simulate_into<S: NormalSource>(&mut self, source: &mut S, path: &mut [f64]) {
        debug_assert_eq!(path.len(), self.mesh.len());
        let dt = self.mesh.step_size();
        let times = self.mesh.points();

        path[0] = self.process.initial_value();
        for n in 1..path.len() {
            let z = source.next_standard_normal();
            path[n] = self.kind.advance(&self.process, path[n - 1], times[n - 1], dt, z);
        }
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn mesh(&self) -> &TimeMesh {
        &self.mesh
    }

    pub fn kind(&self) -> &SchemeKind {
        &self.kind
    }

    pub fn steps(&self) -> usize {
        self.mesh.steps()
    }

    pub fn step_size(&self) -> f64 {
        self.mesh.step_size()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gbm, ProcessParams};
    use crate::rng::RandomSource;

    fn process() -> Process {
        Gbm::new(ProcessParams {
            rate: 0.08,
            volatility: 0.3,
            carry: 0.0,
            spot: 60.0,
            expiry: 0.25,
        })
        .unwrap()
        .into()
    }

    #[test]
    fn test_discretization_builds_mesh_from_expiry() {
        let d = Discretization::euler(process(), 50);
        assert_eq!(d.steps(), 50);
        assert_eq!(*d.mesh().points().last().unwrap(), 0.25);
        assert_eq!(d.name(), "Euler");
    }

    #[test]
    fn test_discretization_dispatches_to_scheme() {
        let mut euler = Discretization::euler(process(), 10);
        let mut milstein = Discretization::milstein(process(), 10);
        let dt = euler.step_size();

        let e = euler.advance(60.0, 0.0, dt, 0.0);
        let m = milstein.advance(60.0, 0.0, dt, 0.0);
        let expected_gap = -0.5 * dt * (0.3 * 60.0) * 0.3;
        assert!((m - e - expected_gap).abs() < 1e-12);
    }

    #[test]
    fn test_simulate_into_starts_at_spot() {
        let mut d = Discretization::milstein(process(), 20);
        let mut source = RandomSource::box_muller(9);
        let mut path = vec![0.0; d.mesh().len()];
        d.simulate_into(&mut source, &mut path);

        assert_eq!(path.len(), 21);
        assert_eq!(path[0], 60.0);
        assert!(path.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_simulate_into_with_no_steps() {
        let mut d = Discretization::euler(process(), -3);
        let mut source = RandomSource::mersenne_normal(9);
        let mut path = vec![0.0; d.mesh().len()];
        d.simulate_into(&mut source, &mut path);
        assert_eq!(path, vec![60.0]);
    }

    #[test]
    fn test_zero_step_scheme_is_identity() {
        let mut d = Discretization::predictor_corrector(process(), 0, 0.5, 0.5).unwrap();
        assert_eq!(d.steps(), 0);
        assert_eq!(d.step_size(), 0.0);
        assert_eq!(d.advance(60.0, 0.0, d.step_size(), 1.3), 60.0);
    }
}
