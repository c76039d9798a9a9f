// src/solvers/mesh.rs
use tracing::warn;

/// Uniform time grid `0, k, 2k, ..., NT·k` with `k = expiry / NT`.
///
/// A negative step count is coerced to zero, which leaves the single point
/// `[0.0]` and a zero step size.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeMesh {
    points: Vec<f64>,
    step: f64,
}

impl TimeMesh {
    pub fn new(expiry: f64, steps: i64) -> Self {
        let nt = if steps < 0 {
            warn!(requested = steps, "negative step count coerced to 0");
            0
        } else {
            steps as usize
        };

        if nt == 0 {
            return TimeMesh {
                points: vec![0.0],
                step: 0.0,
            };
        }

        let step = expiry / nt as f64;
        let mut points: Vec<f64> = (0..=nt).map(|i| i as f64 * step).collect();
        // pin the endpoint so mesh[NT] == expiry regardless of rounding
        points[nt] = expiry;
        TimeMesh { points, step }
    }

    /// Number of time intervals (NT).
    pub fn steps(&self) -> usize {
        self.points.len() - 1
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
