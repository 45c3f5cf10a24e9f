//! Defines a stochastic gradient `Estimator` for the weights of a factor graph.
//!
//! Every epoch is one learning sweep over the graph, followed by a regularization step. The step
//! size decays geometrically from epoch to epoch.

use config::LearningConfig;
use graph::FactorGraph;
use samplers::GibbsSampler;
use super::Estimator;
use util::Result;

pub struct SgdEstimator {

    config: LearningConfig

}

impl SgdEstimator {

    /// Construct an `SgdEstimator` following the schedule in `config`
    ///
    /// # Errors
    /// * `GibbsError::InvalidConfig` if `config` does not validate
    pub fn new(config: LearningConfig) -> Result<Self> {
        config.validate()?;
        Ok(SgdEstimator { config })
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }
}

impl<G: FactorGraph + 'static> Estimator<G> for SgdEstimator {

    fn estimate(&mut self, sampler: &mut GibbsSampler<G>) -> Result<Vec<f64>> {
        let LearningConfig { n_epochs, mut stepsize, decay, regularization, reg_param } = self.config.clone();
        info!(n_epochs, stepsize, decay, ?regularization, reg_param, "Learning weights");

        for i_epoch in 0..n_epochs {
            sampler.sample_sgd(stepsize)?;
            sampler.wait()?;
            sampler.result().regularize(regularization, reg_param, stepsize);

            debug!(epoch = i_epoch, stepsize, "Learning epoch complete");
            stepsize *= decay;
        }

        let weights = sampler.result().weights();
        info!(nweights = weights.len(), "Learning complete");
        Ok(weights)
    }

}
