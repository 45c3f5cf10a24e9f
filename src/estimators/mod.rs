//! Defines an `Estimator`, which learns the weights of a factor graph from its evidence.

use graph::FactorGraph;
use samplers::GibbsSampler;
use util::Result;

mod sgd;
pub use self::sgd::SgdEstimator;

/// A trait that represents the ability to estimate the weights of a factor graph by driving a
/// sampler over it.
pub trait Estimator<G: FactorGraph + 'static> {

    /// Estimate the weights, leaving them in the sampler's `InferenceResult`
    ///
    /// # Returns
    /// the learned weight values, indexed by weight id
    fn estimate(&mut self, sampler: &mut GibbsSampler<G>) -> Result<Vec<f64>>;

}
