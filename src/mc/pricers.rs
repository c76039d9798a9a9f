// src/mc/pricers.rs
//! Path-observing pricers.
//!
//! # Estimator
//!
//! Each pricer accumulates the *undiscounted* payoff `Y_i` of every path it
//! is shown and, once the run is over, reports
//!
//! ```text
//! price = DF · mean(Y)
//! sd    = DF · √Var(Y)        (population variance, clamped at 0)
//! se    = sd / √N
//! ```
//!
//! with `DF = exp(-r T)`. Scaling by the constant `DF` after the fact gives
//! the same statistics as accumulating discounted payoffs.
//!
//! Mean and variance are tracked with Welford's update so that a run of
//! identical payoffs reports a standard deviation of exactly zero, and
//! partial accumulators from parallel workers combine with Chan's rule.

use super::payoffs::{Averaging, KnockRule, PayoffFn};
use crate::error::{SdeError, SdeResult};
use tracing::{debug, warn};

/// Discount factor `exp(-rate · expiry)`.
#[inline]
pub fn discount_factor(rate: f64, expiry: f64) -> f64 {
    (-rate * expiry).exp()
}

/// Receives every simulated path, then reports once.
///
/// Implementors must not keep the slice; the engine reuses its buffer.
pub trait PathObserver {
    fn process_path(&mut self, path: &[f64]);

    /// Idempotent: a second call returns the cached summary.
    fn finalize(&mut self) -> SdeResult<PricingSummary>;
}

/// Running count, mean and sum of squared deviations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathStatistics {
    count: u64,
    mean: f64,
    m2: f64,
}

impl PathStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Folds another partial accumulator into this one.
    pub fn merge(&mut self, other: &PathStatistics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;

        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; never negative.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).max(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.m2 + self.count as f64 * self.mean * self.mean
    }
}

/// Finalised result of one pricer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingSummary {
    pub price: f64,
    pub std_dev: f64,
    pub std_error: f64,
    pub paths: u64,
}

impl PricingSummary {
    /// Normal-approximation 95% interval around the price.
    pub fn confidence_95(&self) -> (f64, f64) {
        let half_width = 1.96 * self.std_error;
        (self.price - half_width, self.price + half_width)
    }
}

/// State shared by every pricer variant.
#[derive(Clone, Debug)]
struct Ledger {
    discount: f64,
    stats: PathStatistics,
    summary: Option<PricingSummary>,
}

impl Ledger {
    fn new(discount: f64) -> Self {
        Ledger {
            discount,
            stats: PathStatistics::new(),
            summary: None,
        }
    }

    fn fresh(&self) -> Self {
        Ledger::new(self.discount)
    }

    /// False once finalised; the accumulators are frozen from then on.
    fn accepting(&self, method: &str) -> bool {
        if self.summary.is_some() {
            debug!(pricer = method, "path ignored by finalised pricer");
            return false;
        }
        true
    }

    fn finalize(&mut self, method: &str) -> SdeResult<PricingSummary> {
        if let Some(summary) = self.summary {
            return Ok(summary);
        }
        let n = self.stats.count();
        if n == 0 {
            return Err(SdeError::MonteCarloError {
                paths: 0,
                reason: format!("{} pricer finalised before any path was processed", method),
            });
        }

        let price = self.discount * self.stats.mean();
        let std_dev = self.discount * self.stats.variance().sqrt();
        let std_error = std_dev / (n as f64).sqrt();

        if !price.is_finite() || !std_dev.is_finite() {
            return Err(SdeError::NumericalInstability {
                method: method.to_string(),
                reason: format!("non-finite estimate (price = {}, sd = {})", price, std_dev),
            });
        }

        let summary = PricingSummary {
            price,
            std_dev,
            std_error,
            paths: n,
        };
        self.summary = Some(summary);
        Ok(summary)
    }
}

/// Pays `payoff(S_T)` on the last point of the path.
#[derive(Clone, Debug)]
pub struct EuropeanPricer {
    pub payoff: PayoffFn,
    ledger: Ledger,
}

impl EuropeanPricer {
    pub fn new(payoff: PayoffFn, discount: f64) -> Self {
        EuropeanPricer {
            payoff,
            ledger: Ledger::new(discount),
        }
    }
}

impl PathObserver for EuropeanPricer {
    #[inline]
    fn process_path(&mut self, path: &[f64]) {
        if !self.ledger.accepting("European") {
            return;
        }
        let terminal = path.last().copied().unwrap_or(f64::NAN);
        self.ledger.stats.push(self.payoff.apply(terminal));
    }

    fn finalize(&mut self) -> SdeResult<PricingSummary> {
        self.ledger.finalize("European")
    }
}

/// Pays `payoff(average(path))`.
#[derive(Clone, Debug)]
pub struct AsianPricer {
    pub payoff: PayoffFn,
    pub averaging: Averaging,
    ledger: Ledger,
}

impl AsianPricer {
    pub fn new(payoff: PayoffFn, averaging: Averaging, discount: f64) -> Self {
        AsianPricer {
            payoff,
            averaging,
            ledger: Ledger::new(discount),
        }
    }
}

impl PathObserver for AsianPricer {
    #[inline]
    fn process_path(&mut self, path: &[f64]) {
        if !self.ledger.accepting("Asian") {
            return;
        }
        let average = self.averaging.apply(path);
        self.ledger.stats.push(self.payoff.apply(average));
    }

    fn finalize(&mut self) -> SdeResult<PricingSummary> {
        self.ledger.finalize("Asian")
    }
}

/// European payoff gated by a knock rule. Voided paths still count, with
/// payoff zero.
#[derive(Clone, Debug)]
pub struct BarrierPricer {
    pub payoff: PayoffFn,
    pub knock: KnockRule,
    ledger: Ledger,
}

impl BarrierPricer {
    pub fn new(payoff: PayoffFn, knock: KnockRule, discount: f64) -> Self {
        BarrierPricer {
            payoff,
            knock,
            ledger: Ledger::new(discount),
        }
    }
}

impl PathObserver for BarrierPricer {
    #[inline]
    fn process_path(&mut self, path: &[f64]) {
        if !self.ledger.accepting("Barrier") {
            return;
        }
        let value = if self.knock.knocked_out(path) {
            0.0
        } else {
            self.payoff.apply(path.last().copied().unwrap_or(f64::NAN))
        };
        self.ledger.stats.push(value);
    }

    fn finalize(&mut self) -> SdeResult<PricingSummary> {
        self.ledger.finalize("Barrier")
    }
}

#[derive(Clone, Debug)]
enum PricerKind {
    European(EuropeanPricer),
    Asian(AsianPricer),
    Barrier(BarrierPricer),
}

/// Any pricer the engine can notify, with an optional reporting label.
#[derive(Clone, Debug)]
pub struct Pricer {
    label: Option<String>,
    kind: PricerKind,
}

impl Pricer {
    pub fn european(payoff: PayoffFn, discount: f64) -> Self {
        EuropeanPricer::new(payoff, discount).into()
    }

    pub fn asian(payoff: PayoffFn, averaging: Averaging, discount: f64) -> Self {
        AsianPricer::new(payoff, averaging, discount).into()
    }

    pub fn barrier(payoff: PayoffFn, knock: KnockRule, discount: f64) -> Self {
        BarrierPricer::new(payoff, knock, discount).into()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label if set, otherwise a generated description such as
    /// `"Asian Geometric Call"`.
    pub fn describe(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.kind {
            PricerKind::European(p) => format!("European {}", p.payoff.name()),
            PricerKind::Asian(p) => {
                let avg = match p.averaging {
                    Averaging::Arithmetic => "Arithmetic",
                    Averaging::Geometric => "Geometric",
                };
                format!("Asian {} {}", avg, p.payoff.name())
            }
            PricerKind::Barrier(p) => format!("{} {}", p.knock.name(), p.payoff.name()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            PricerKind::European(_) => "European",
            PricerKind::Asian(_) => "Asian",
            PricerKind::Barrier(_) => "Barrier",
        }
    }

    fn ledger(&self) -> &Ledger {
        match &self.kind {
            PricerKind::European(p) => &p.ledger,
            PricerKind::Asian(p) => &p.ledger,
            PricerKind::Barrier(p) => &p.ledger,
        }
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        match &mut self.kind {
            PricerKind::European(p) => &mut p.ledger,
            PricerKind::Asian(p) => &mut p.ledger,
            PricerKind::Barrier(p) => &mut p.ledger,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        self.ledger().discount
    }

    pub fn statistics(&self) -> &PathStatistics {
        &self.ledger().stats
    }

    /// Cached result, if [`PathObserver::finalize`] has succeeded.
    pub fn summary(&self) -> Option<&PricingSummary> {
        self.ledger().summary.as_ref()
    }

    /// Same instrument with empty accumulators, for a parallel worker.
    pub fn fork(&self) -> Self {
        let mut forked = self.clone();
        let fresh = self.ledger().fresh();
        *forked.ledger_mut() = fresh;
        forked
    }

    /// Adds the paths seen by a forked copy to this pricer. A finalised
    /// pricer keeps its statistics unchanged.
    pub fn absorb(&mut self, partial: &Pricer) {
        if self.summary().is_some() {
            warn!(pricer = self.name(), "cannot absorb paths into a finalised pricer");
            return;
        }
        let other = partial.ledger().stats;
        self.ledger_mut().stats.merge(&other);
    }
}

impl PathObserver for Pricer {
    #[inline]
    fn process_path(&mut self, path: &[f64]) {
        match &mut self.kind {
            PricerKind::European(p) => p.process_path(path),
            PricerKind::Asian(p) => p.process_path(path),
            PricerKind::Barrier(p) => p.process_path(path),
        }
    }

    fn finalize(&mut self) -> SdeResult<PricingSummary> {
        match &mut self.kind {
            PricerKind::European(p) => p.finalize(),
            PricerKind::Asian(p) => p.finalize(),
            PricerKind::Barrier(p) => p.finalize(),
        }
    }
}

impl From<EuropeanPricer> for Pricer {
    fn from(p: EuropeanPricer) -> Self {
        Pricer {
            label: None,
            kind: PricerKind::European(p),
        }
    }
}

impl From<AsianPricer> for Pricer {
    fn from(p: AsianPricer) -> Self {
        Pricer {
            label: None,
            kind: PricerKind::Asian(p),
        }
    }
}

impl From<BarrierPricer> for Pricer {
    fn from(p: BarrierPricer) -> Self {
        Pricer {
            label: None,
            kind: PricerKind::Barrier(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CALL_65: PayoffFn = PayoffFn::Call { strike: 65.0 };

    #[test]
    fn test_statistics_match_naive_formulas() {
        let values = [1.0, 4.0, 2.5, 7.0, 0.0];
        let mut stats = PathStatistics::new();
        for v in values {
            stats.push(v);
        }
        let n = values.len() as f64;
        let sum: f64 = values.iter().sum();
        let sum_sq: f64 = values.iter().map(|v| v * v).sum();

        assert_eq!(stats.count(), 5);
        assert_relative_eq!(stats.sum(), sum, max_relative = 1e-12);
        assert_relative_eq!(stats.sum_of_squares(), sum_sq, max_relative = 1e-12);
        assert_relative_eq!(stats.variance(), sum_sq / n - (sum / n).powi(2), max_relative = 1e-12);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        let mut whole = PathStatistics::new();
        values.iter().for_each(|&v| whole.push(v));

        let mut left = PathStatistics::new();
        let mut right = PathStatistics::new();
        values[..30].iter().for_each(|&v| left.push(v));
        values[30..].iter().for_each(|&v| right.push(v));
        left.merge(&right);

        assert_eq!(left.count(), whole.count());
        assert_relative_eq!(left.mean(), whole.mean(), epsilon = 1e-12);
        assert_relative_eq!(left.variance(), whole.variance(), max_relative = 1e-10);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let mut a = PathStatistics::new();
        let mut b = PathStatistics::new();
        b.push(3.0);
        a.merge(&b);
        assert_eq!(a, b);
        a.merge(&PathStatistics::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_payoffs_give_exact_zero_deviation() {
        let mut pricer = Pricer::european(CALL_65, 0.98);
        for _ in 0..1_000 {
            pricer.process_path(&[60.0, 70.3]);
        }
        let s = pricer.finalize().unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.std_error, 0.0);
        assert_relative_eq!(s.price, 0.98 * 5.3, max_relative = 1e-12);
    }

    #[test]
    fn test_european_uses_terminal_value() {
        let mut pricer = Pricer::european(CALL_65, 1.0);
        pricer.process_path(&[60.0, 90.0, 70.0]);
        pricer.process_path(&[60.0, 50.0, 60.0]);
        let s = pricer.finalize().unwrap();
        assert_relative_eq!(s.price, 2.5);
        assert_relative_eq!(s.std_dev, 2.5);
        assert_relative_eq!(s.std_error, 2.5 / 2f64.sqrt());
        assert_eq!(s.paths, 2);
    }

    #[test]
    fn test_asian_averages_whole_path() {
        let call_60 = PayoffFn::Call { strike: 60.0 };
        let mut pricer = Pricer::asian(call_60, Averaging::Arithmetic, 1.0);
        pricer.process_path(&[60.0, 62.0, 64.0, 66.0]);
        assert_relative_eq!(pricer.finalize().unwrap().price, 3.0);
    }

    #[test]
    fn test_barrier_voided_paths_count() {
        let knock = KnockRule::UpAndOut { barrier: 80.0 };
        let mut pricer = Pricer::barrier(CALL_65, knock, 1.0);
        pricer.process_path(&[60.0, 85.0, 75.0]); // knocked out
        pricer.process_path(&[60.0, 70.0, 75.0]); // pays 10
        let s = pricer.finalize().unwrap();
        assert_eq!(s.paths, 2);
        assert_relative_eq!(s.price, 5.0);
    }

    #[test]
    fn test_finalize_without_paths_fails() {
        let mut pricer = Pricer::european(CALL_65, 1.0);
        assert!(matches!(
            pricer.finalize(),
            Err(SdeError::MonteCarloError { paths: 0, .. })
        ));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut pricer = Pricer::european(CALL_65, 1.0);
        pricer.process_path(&[60.0, 70.0]);
        let first = pricer.finalize().unwrap();
        assert_eq!(pricer.finalize().unwrap(), first);
        assert_eq!(pricer.summary(), Some(&first));
    }

    #[test]
    fn test_finalised_pricer_is_frozen() {
        for mut pricer in [
            Pricer::european(CALL_65, 1.0),
            Pricer::asian(CALL_65, Averaging::Arithmetic, 1.0),
            Pricer::barrier(CALL_65, KnockRule::DownAndOut { barrier: 40.0 }, 1.0),
        ] {
            pricer.process_path(&[60.0, 70.0]);
            let mut fork = pricer.fork();
            fork.process_path(&[60.0, 90.0]);
            let first = pricer.finalize().unwrap();
            let before = *pricer.statistics();

            pricer.process_path(&[60.0, 100.0]);
            pricer.absorb(&fork);

            assert_eq!(*pricer.statistics(), before);
            assert_eq!(pricer.statistics().count(), first.paths);
            assert_eq!(pricer.finalize().unwrap(), first);
        }
    }

    #[test]
    fn test_fork_and_absorb() {
        let mut parent = Pricer::european(CALL_65, 0.9).with_label("desk");
        parent.process_path(&[60.0, 70.0]);

        let mut child = parent.fork();
        assert_eq!(child.statistics().count(), 0);
        assert_eq!(child.label(), Some("desk"));
        assert_eq!(child.discount_factor(), 0.9);
        child.process_path(&[60.0, 80.0]);

        parent.absorb(&child);
        let s = parent.finalize().unwrap();
        assert_eq!(s.paths, 2);
        assert_relative_eq!(s.price, 0.9 * 10.0);
    }

    #[test]
    fn test_describe() {
        let asian = Pricer::asian(CALL_65, Averaging::Geometric, 1.0);
        assert_eq!(asian.describe(), "Asian Geometric Call");
        let knock = KnockRule::DownAndIn { barrier: 50.0 };
        let barrier = Pricer::barrier(PayoffFn::Put { strike: 65.0 }, knock, 1.0);
        assert_eq!(barrier.describe(), "Down-And-In Put");
        assert_eq!(barrier.with_label("x").describe(), "x");
    }

    #[test]
    fn test_confidence_interval() {
        let s = PricingSummary {
            price: 2.0,
            std_dev: 1.0,
            std_error: 0.5,
            paths: 4,
        };
        let (lo, hi) = s.confidence_95();
        assert_relative_eq!(lo, 1.02, max_relative = 1e-12);
        assert_relative_eq!(hi, 2.98, max_relative = 1e-12);
    }

    #[test]
    fn test_discount_factor() {
        assert_relative_eq!(discount_factor(0.08, 0.25), (-0.02f64).exp());
        assert_eq!(discount_factor(0.0, 1.0), 1.0);
    }
}
