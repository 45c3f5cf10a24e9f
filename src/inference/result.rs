//! Defines the `InferenceResult`, the mutable state a Gibbs sampler reads and writes.

use factor::{Weight, WeightIndex};
use graph::FactorGraph;
use init::Initialization;
use shared::SharedArray;
use util::{GibbsError, Result};
use variable::{DomainType, Variable, VariableValue};
use super::Marginal;

use ndarray::prelude as nd;
use serde::{Deserialize, Serialize};

/// Penalty applied to learnable weights after every learning epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regularization {
    None,
    L1,
    L2
}

impl Default for Regularization {
    fn default() -> Self {
        Regularization::L2
    }
}


/// Assignments, aggregates and weights of one sampler.
///
/// # Representation
/// Everything that changes while sampling lives in a `SharedArray` so that all sampler threads can
/// work on it at once. Each variable's assignment and aggregate slots are written only by the
/// thread owning its shard; weights are written by every thread.
pub struct InferenceResult {

    /// Assignment that respects evidence. This is the chain inference reports on.
    assignments_evid: SharedArray<VariableValue>,

    /// Assignment that ignores evidence, used only while learning
    assignments_free: SharedArray<VariableValue>,

    weight_values: SharedArray<f64>,

    /// `true` for weights learning must leave alone
    weights_isfixed: Vec<bool>,

    /// Number of samples drawn per variable
    agg_nsamples: SharedArray<u64>,

    /// Sum of the samples drawn per boolean variable
    agg_means: SharedArray<f64>,

    /// Count of each value drawn per multinomial variable; a variable's cells start at its tally
    /// offset
    multinomial_tallies: SharedArray<u64>

}


impl InferenceResult {

    /// Allocate the state for sampling `fg`.
    ///
    /// # Args
    /// * `fg`: the factor graph to sample
    /// * `weights`: starting values for all of the graph's weights, in any order
    /// * `init`: how to pick the starting assignment
    /// * `seed`: seeds the starting assignment when it is random
    ///
    /// # Errors
    /// * `GibbsError::WeightMismatch` if `weights` does not cover each of the graph's weights
    ///   exactly once
    pub fn new<G: FactorGraph + ?Sized>(fg: &G, weights: &[Weight], init: Initialization,
                                        seed: u64) -> Result<Self> {
        let nweights = fg.num_weights();
        if weights.len() != nweights {
            return Err(GibbsError::WeightMismatch(
                format!("the graph has {} weights, but {} were given", nweights, weights.len())
            ));
        }

        let mut values = vec![0.0; nweights];
        let mut isfixed = vec![false; nweights];
        let mut seen = vec![false; nweights];
        for w in weights {
            if w.id >= nweights || seen[w.id] {
                return Err(GibbsError::WeightMismatch(format!("unexpected weight id {}", w.id)));
            }
            seen[w.id] = true;
            values[w.id] = w.value;
            isfixed[w.id] = w.is_fixed;
        }

        let nvars = fg.num_variables();
        let assignment = init.assign(fg.variables(), seed);

        Ok(InferenceResult {
            assignments_evid: SharedArray::from_slice(&assignment),
            assignments_free: SharedArray::from_slice(&assignment),
            weight_values: SharedArray::from_slice(&values),
            weights_isfixed: isfixed,
            agg_nsamples: SharedArray::new(nvars, 0),
            agg_means: SharedArray::new(nvars, 0.0),
            multinomial_tallies: SharedArray::new(fg.num_tallies(), 0)
        })
    }

    pub fn assignments_evid(&self) -> &SharedArray<VariableValue> {
        &self.assignments_evid
    }

    pub fn assignments_free(&self) -> &SharedArray<VariableValue> {
        &self.assignments_free
    }

    pub fn weight_values(&self) -> &SharedArray<f64> {
        &self.weight_values
    }

    pub fn agg_nsamples(&self) -> &SharedArray<u64> {
        &self.agg_nsamples
    }

    pub fn agg_means(&self) -> &SharedArray<f64> {
        &self.agg_means
    }

    pub fn multinomial_tallies(&self) -> &SharedArray<u64> {
        &self.multinomial_tallies
    }

    /// Get the number of weights
    pub fn num_weights(&self) -> usize {
        self.weights_isfixed.len()
    }

    pub fn is_weight_fixed(&self, wid: WeightIndex) -> bool {
        self.weights_isfixed[wid]
    }

    /// A copy of the current weight values
    pub fn weights(&self) -> Vec<f64> {
        self.weight_values.to_vec()
    }

    /// Take one gradient ascent step on weight `wid`
    #[inline]
    pub fn update_weight(&self, wid: WeightIndex, stepsize: f64, gradient: f64) {
        self.weight_values.add(wid, stepsize * gradient);
    }

    /// Shrink every learnable weight towards zero.
    ///
    /// * `L2` scales each weight by `1 / (1 + reg_param * stepsize)`
    /// * `L1` moves each weight `reg_param * stepsize` towards zero, stopping at zero
    pub fn regularize(&self, regularization: Regularization, reg_param: f64, stepsize: f64) {
        let shrink = reg_param * stepsize;
        for wid in (0..self.num_weights()).filter(|&w| ! self.is_weight_fixed(w)) {
            match regularization {
                Regularization::None => return,
                Regularization::L2 => self.weight_values.update(wid, |w| w / (1.0 + shrink)),
                Regularization::L1 => self.weight_values.update(wid, |w| {
                    w.signum() * (w.abs() - shrink).max(0.0)
                })
            }
        }
    }

    /// Record one sample of `variable`
    #[inline]
    pub fn record_sample(&self, variable: &Variable, value: VariableValue, index: usize) {
        let vid = variable.id();
        self.agg_nsamples.increment(vid);
        match variable.domain_type() {
            DomainType::Boolean => self.agg_means.add(vid, value as f64),
            _ => self.multinomial_tallies.increment(variable.tally_offset() + index)
        }
    }

    /// Reset every aggregate, leaving assignments and weights alone
    pub fn clear_variabletally(&self) {
        self.agg_nsamples.fill(0);
        self.agg_means.fill(0.0);
        self.multinomial_tallies.fill(0);
    }

    /// Estimate the marginal distribution of `variable` from the aggregates.
    ///
    /// # Returns
    /// the marginal, or `None` if `variable` has not been sampled since the aggregates were last
    /// cleared
    pub fn marginal(&self, variable: &Variable) -> Option<Marginal> {
        let vid = variable.id();
        let n = self.agg_nsamples.get(vid);
        if n == 0 {
            return None;
        }

        match variable.domain_type() {
            DomainType::Boolean => Some(Marginal::Boolean(self.agg_means.get(vid) / n as f64)),
            DomainType::Multinomial => {
                let offset = variable.tally_offset();
                let counts = (0..variable.domain_size()).map(|i| self.multinomial_tallies.get(offset + i));
                let p: nd::Array1<f64> = counts.map(|c| c as f64 / n as f64).collect();
                Some(Marginal::Multinomial(p))
            },
            DomainType::Continuous => None
        }
    }
}
