//! Defines a `GibbsSampler`, which coordinates the sampler threads of one node.
//!
//! Every sweep is Hogwild-style: all shards are sampled at once against the same assignments and
//! weights, with no locking. Reads may see values that another thread is about to overwrite and
//! concurrent weight updates may be lost. Both are accepted in exchange for throughput.

use config::SamplerConfig;
use factor::Weight;
use graph::{CompactFactorGraph, FactorGraph};
use inference::InferenceResult;
use util::{GibbsError, Result};
use super::{shards, GibbsSamplerThread, Rand48, Shard};

use rand::SeedableRng;

use std::sync::Arc;
use std::sync::mpsc::{self, SendError};
use std::thread::{self, JoinHandle};

/// Yields the worker and its result, or `None` if the worker never arrived
type SweepHandle<G> = JoinHandle<Option<(GibbsSamplerThread<G>, Result<()>)>>;

/// Samples a factor graph with one thread per shard.
///
/// A sweep is started with `sample` or `sample_sgd` and finished with `wait`. Only one sweep may
/// be outstanding at a time.
pub struct GibbsSampler<G = CompactFactorGraph> where G: FactorGraph + 'static {

    fg: Arc<G>,

    infrs: Arc<InferenceResult>,

    /// One worker per shard. A worker is out of its slot while its sweep runs.
    workers: Vec<Option<GibbsSamplerThread<G>>>,

    /// The running sweep, by shard
    running: Vec<(usize, SweepHandle<G>)>,

    shards: Vec<Shard>,

    nthread: usize,

    nodeid: usize,

    stack_size: Option<usize>

}


impl<G> GibbsSampler<G> where G: FactorGraph + 'static {

    /// Construct a `GibbsSampler` for `fg`.
    ///
    /// # Args
    /// * `fg`: the factor graph to sample
    /// * `weights`: starting values for all of the graph's weights
    /// * `nthread`: the number of shards, and of threads sampling them
    /// * `nodeid`: this node's index among the nodes sampling the same graph; only seeds the
    ///   threads
    /// * `config`: sampler flags, base seed and initialization
    ///
    /// # Errors
    /// * `GibbsError::ZeroThreads` if `nthread` is zero
    /// * `GibbsError::TooManyShards` if `nthread` exceeds the number of variables
    /// * `GibbsError::UnsupportedDomain` if a variable that may be drawn cannot be sampled
    /// * `GibbsError::WeightMismatch` if `weights` does not cover the graph's weights
    pub fn new(fg: G, weights: &[Weight], nthread: usize, nodeid: usize,
               config: &SamplerConfig) -> Result<Self> {
        let nvariables = fg.num_variables();
        let shards = shards(nvariables, nthread)?;

        // observations are never drawn, anything else may be
        let unsampleable = fg.variables()
                             .iter()
                             .find(|v| ! v.is_observation() && ! v.domain_type().is_sampleable());
        if let Some(v) = unsampleable {
            return Err(GibbsError::UnsupportedDomain { vid: v.id(), domain: v.domain_type() });
        }

        let infrs = InferenceResult::new(&fg, weights, config.initialization, config.seed)?;

        let fg = Arc::new(fg);
        let infrs = Arc::new(infrs);
        let workers = shards.iter()
                            .enumerate()
                            .map(|(i, shard)| {
                                let seed = config.seed.wrapping_add((nodeid * nthread + i) as u64);
                                let rng = Rand48::seed_from_u64(seed);
                                Some(GibbsSamplerThread::new(fg.clone(), infrs.clone(), shard.clone(), rng, config))
                            })
                            .collect();

        info!(nodeid, nthread, nvariables, nweights = weights.len(), "Constructed Gibbs sampler");

        Ok(GibbsSampler { fg, infrs, workers, running: Vec::new(), shards, nthread, nodeid,
                          stack_size: config.stack_size })
    }

    /// Start an inference sweep: every thread samples its shard once.
    ///
    /// Returns as soon as the threads are started.
    ///
    /// # Errors
    /// * `GibbsError::SweepInProgress` if the previous sweep was not waited on
    /// * `GibbsError::WorkerUnavailable` if a worker was lost to an earlier failure
    /// * `GibbsError::Spawn` if a thread could not be started. Threads that did start are still
    ///   running and must be waited on; the worker that was not started stays in its slot.
    pub fn sample(&mut self, i_epoch: usize) -> Result<()> {
        debug!(nodeid = self.nodeid, epoch = i_epoch, "Starting inference sweep");
        self.start(|worker| worker.sample())
    }

    /// Start a learning sweep: every thread takes a gradient step for each variable of its shard.
    ///
    /// Fails the same ways `sample` does.
    pub fn sample_sgd(&mut self, stepsize: f64) -> Result<()> {
        debug!(nodeid = self.nodeid, stepsize, "Starting learning sweep");
        self.start(move |worker| worker.sample_sgd(stepsize))
    }

    /// Block until every thread of the running sweep is done.
    ///
    /// Returns immediately if no sweep is running.
    ///
    /// # Errors
    /// The first failure among the threads, after all of them have been joined:
    /// * `GibbsError::UnsupportedDomain` if a thread met a variable it cannot sample
    /// * `GibbsError::WorkerPanicked` if a thread panicked. Its worker is lost.
    pub fn wait(&mut self) -> Result<()> {
        let mut failure = None;

        for (i, handle) in self.running.drain(..) {
            match handle.join() {
                Ok(None) => (),
                Ok(Some((worker, result))) => {
                    self.workers[i] = Some(worker);
                    if let Err(e) = result {
                        error!(nodeid = self.nodeid, shard = i, error = %e, "Sweep failed");
                        failure = failure.or(Some(e));
                    }
                },
                Err(_) => {
                    error!(nodeid = self.nodeid, shard = i, "Sampler thread panicked");
                    failure = failure.or(Some(GibbsError::WorkerPanicked(i)));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    /// Whether a sweep has been started and not yet waited on
    pub fn is_running(&self) -> bool {
        ! self.running.is_empty()
    }

    pub fn graph(&self) -> &G {
        &self.fg
    }

    /// The assignments, weights and aggregates the threads write to
    pub fn result(&self) -> &InferenceResult {
        &self.infrs
    }

    pub fn nthread(&self) -> usize {
        self.nthread
    }

    pub fn nodeid(&self) -> usize {
        self.nodeid
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// The worker of shard `i`, unless a sweep is running or the worker was lost
    pub fn worker_mut(&mut self, i: usize) -> Option<&mut GibbsSamplerThread<G>> {
        if self.is_running() {
            return None;
        }
        self.workers.get_mut(i).and_then(|w| w.as_mut())
    }

    fn start<F>(&mut self, sweep: F) -> Result<()>
        where F: Fn(&mut GibbsSamplerThread<G>) -> Result<()> + Clone + Send + 'static
    {
        if self.is_running() {
            return Err(GibbsError::SweepInProgress);
        }

        if let Some(i) = self.workers.iter().position(|w| w.is_none()) {
            return Err(GibbsError::WorkerUnavailable(i));
        }

        for i in 0..self.workers.len() {
            let mut builder = thread::Builder::new().name(format!("gibbs-{}-{}", self.nodeid, i));
            if let Some(size) = self.stack_size {
                builder = builder.stack_size(size);
            }

            // the worker is handed over only once the thread exists, so a failed spawn keeps it
            let (handoff, receiver) = mpsc::channel::<GibbsSamplerThread<G>>();
            let sweep = sweep.clone();
            let handle = builder
                .spawn(move || {
                    receiver.recv().ok().map(|mut worker| {
                        let result = sweep(&mut worker);
                        (worker, result)
                    })
                })
                .map_err(GibbsError::Spawn)?;

            if let Some(worker) = self.workers[i].take() {
                if let Err(SendError(worker)) = handoff.send(worker) {
                    self.workers[i] = Some(worker);
                }
            }

            self.running.push((i, handle));
        }

        Ok(())
    }
}

impl<G> Drop for GibbsSampler<G> where G: FactorGraph + 'static {

    fn drop(&mut self) {
        if let Err(e) = self.wait() {
            warn!(nodeid = self.nodeid, error = %e, "Sweep failed while dropping sampler");
        }
    }

}
