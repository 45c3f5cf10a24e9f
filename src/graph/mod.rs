//! Defines a `FactorGraph`, the view of a probabilistic factor graph the samplers work against.
//!
//! The samplers never look at factors directly. They ask a `FactorGraph` for the variables it
//! holds, for the log-potential of a candidate value, and to take a gradient step on the weights
//! around a variable.

use inference::InferenceResult;
use shared::SharedArray;
use variable::{DomainType, Variable, VariableValue};

mod compact;

pub use self::compact::{CompactFactorGraph, FactorGraphBuilder};

/// The `FactorGraph` trait represents the topology and potential function of a factor graph.
///
/// The topology is immutable once built. Implementations must be safe to call from many sampler
/// threads at once, each with a different assignment snapshot.
pub trait FactorGraph: Send + Sync {

    /// All `Variable`s, indexed by id
    fn variables(&self) -> &[Variable];


    /// Get the number of `Variable`s in the graph
    fn num_variables(&self) -> usize {
        self.variables().len()
    }


    /// Get the number of weights the factors refer to
    fn num_weights(&self) -> usize;


    /// Get the number of multinomial tally cells the variables need
    fn num_tallies(&self) -> usize {
        self.variables()
            .iter()
            .filter(|v| v.domain_type() == DomainType::Multinomial)
            .map(|v| v.domain_size())
            .sum()
    }


    /// The log-potential of `variable` taking the value `proposal`, with every other variable
    /// read from `assignments`.
    ///
    /// # Args
    /// * `variable`: the variable being resampled
    /// * `proposal`: the candidate value
    /// * `assignments`: an assignment snapshot; other threads may be writing to it
    /// * `weights`: the current weight values
    ///
    /// # Returns
    /// the sum of the weighted contributions of all factors incident to `variable`
    fn potential(&self, variable: &Variable, proposal: VariableValue,
                 assignments: &SharedArray<VariableValue>, weights: &SharedArray<f64>) -> f64;


    /// Take one stochastic gradient step on every learnable weight incident to `variable`.
    ///
    /// The gradient of a weight is the factor value under the evidence assignment minus the
    /// factor value under the free assignment. Other threads may be updating the same weights.
    fn update_weight(&self, variable: &Variable, infrs: &InferenceResult, stepsize: f64);

}
