// src/mc/engine.rs
//! Simulation orchestrator.
//!
//! The engine owns a [`Discretization`], a [`RandomSource`] and an ordered
//! list of subscribed [`Pricer`]s. Each simulated path is written into a
//! single reusable buffer and handed to every subscriber in subscription
//! order; after the last path every subscriber is finalised exactly once.
//!
//! ```text
//! Configured --run()--> Running --(NSim paths)--> Finished
//! ```
//!
//! Subscribing and unsubscribing are only possible before the run, and a
//! finished engine cannot be run again.

use super::pricers::{PathObserver, Pricer, PricingSummary};
use crate::error::{validation::*, SdeError, SdeResult};
use crate::rng::RandomSource;
use crate::solvers::Discretization;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Handle returned by [`MonteCarloEngine::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Configured,
    Running,
    Finished,
}

pub struct MonteCarloEngine {
    scheme: Discretization,
    source: RandomSource,
    paths: usize,
    subscribers: Vec<(SubscriberId, Pricer)>,
    next_id: u64,
    state: EngineState,
}

impl MonteCarloEngine {
    pub fn new(scheme: Discretization, source: RandomSource, paths: usize) -> SdeResult<Self> {
        validate_paths(paths)?;
        Ok(MonteCarloEngine {
            scheme,
            source,
            paths,
            subscribers: Vec::new(),
            next_id: 0,
            state: EngineState::Configured,
        })
    }

    fn ensure_configurable(&self, action: &str) -> SdeResult<()> {
        if self.state == EngineState::Configured {
            Ok(())
        } else {
            Err(SdeError::InvalidState {
                action: action.to_string(),
                state: format!("{:?}", self.state),
            })
        }
    }

    pub fn subscribe(&mut self, pricer: Pricer) -> SdeResult<SubscriberId> {
        self.ensure_configurable("subscribe")?;
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, pricer));
        Ok(id)
    }

    /// Removes a subscriber, returning it if it was present.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> SdeResult<Option<Pricer>> {
        self.ensure_configurable("unsubscribe")?;
        let removed = self
            .subscribers
            .iter()
            .position(|(sid, _)| *sid == id)
            .map(|pos| self.subscribers.remove(pos).1);
        Ok(removed)
    }

    /// Runs every path on the calling thread.
    pub fn run(&mut self) -> SdeResult<()> {
        self.ensure_configurable("run")?;
        self.state = EngineState::Running;
        let start = Instant::now();
        self.log_start(1);

        let mut path = vec![0.0; self.scheme.mesh().len()];
        let report_every = (self.paths / 10).max(1);

        for i in 0..self.paths {
            self.scheme.simulate_into(&mut self.source, &mut path);
            for (_, pricer) in self.subscribers.iter_mut() {
                pricer.process_path(&path);
            }
            if (i + 1) % report_every == 0 {
                debug!(
                    completed = i + 1,
                    total = self.paths,
                    "progress {:.0}%",
                    100.0 * (i + 1) as f64 / self.paths as f64
                );
            }
        }

        self.finish(start)
    }

    /// Splits the paths across `workers` rayon tasks.
    ///
    /// Worker `w` simulates with its own copy of the scheme, a source from
    /// `source.spawn(w)` and empty forks of every subscriber. The forks are
    /// merged back in subscription order before finalising. Results are
    /// reproducible for a given seed and worker count.
    pub fn run_parallel(&mut self, workers: usize) -> SdeResult<()> {
        self.ensure_configurable("run")?;
        let workers = workers.clamp(1, self.paths);
        // every fallible step happens before the state leaves Configured
        let sources = (0..workers)
            .map(|w| self.source.spawn(w as u64))
            .collect::<SdeResult<Vec<_>>>()?;
        self.state = EngineState::Running;
        let start = Instant::now();
        self.log_start(workers);

        let base = self.paths / workers;
        let remainder = self.paths % workers;
        let scheme = &self.scheme;
        let subscribers = &self.subscribers;

        let partials: Vec<Vec<Pricer>> = sources
            .into_par_iter()
            .enumerate()
            .map(|(w, mut source)| {
                let count = base + usize::from(w < remainder);
                let mut scheme = scheme.clone();
                let mut forks: Vec<Pricer> = subscribers.iter().map(|(_, p)| p.fork()).collect();
                let mut path = vec![0.0; scheme.mesh().len()];

                for _ in 0..count {
                    scheme.simulate_into(&mut source, &mut path);
                    for fork in forks.iter_mut() {
                        fork.process_path(&path);
                    }
                }
                debug!(worker = w, paths = count, "worker finished");
                forks
            })
            .collect();

        for forks in partials {
            for ((_, pricer), fork) in self.subscribers.iter_mut().zip(forks.iter()) {
                pricer.absorb(fork);
            }
        }

        self.finish(start)
    }

    fn log_start(&self, workers: usize) {
        if self.subscribers.is_empty() {
            warn!("running simulation with no subscribed pricers");
        }
        info!(
            process = self.scheme.process().name(),
            scheme = self.scheme.name(),
            source = self.source.kind().name(),
            steps = self.scheme.steps(),
            paths = self.paths,
            workers,
            subscribers = self.subscribers.len(),
            "simulation started"
        );
    }

    /// Finalises every subscriber in order. All of them are attempted; the
    /// first failure is returned.
    fn finish(&mut self, start: Instant) -> SdeResult<()> {
        self.state = EngineState::Finished;
        let mut first_error = None;
        for (id, pricer) in self.subscribers.iter_mut() {
            if let Err(err) = pricer.finalize() {
                warn!(subscriber = ?id, error = %err, "pricer failed to finalise");
                first_error.get_or_insert(err);
            }
        }
        info!(
            paths = self.paths,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulation finished"
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn paths(&self) -> usize {
        self.paths
    }

    pub fn scheme(&self) -> &Discretization {
        &self.scheme
    }

    pub fn source(&self) -> &RandomSource {
        &self.source
    }

    pub fn subscriber(&self, id: SubscriberId) -> Option<&Pricer> {
        self.subscribers
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, p)| p)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = (SubscriberId, &Pricer)> {
        self.subscribers.iter().map(|(id, p)| (*id, p))
    }

    /// Finalised summaries in subscription order. Empty before the run.
    pub fn results(&self) -> Vec<(SubscriberId, PricingSummary)> {
        self.subscribers
            .iter()
            .filter_map(|(id, p)| p.summary().map(|s| (*id, *s)))
            .collect()
    }
}
