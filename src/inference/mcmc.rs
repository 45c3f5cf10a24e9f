//! Defines the `McmcEngine`, which estimates marginals by running a `GibbsSampler`.
//!
//! Implementation of MCMC marginal inference described in Koller & Friedman 12.3.5

use graph::FactorGraph;
use samplers::GibbsSampler;
use util::Result;
use super::Marginal;

/// Runs inference sweeps and reads the marginals off the sampler's aggregates.
pub struct McmcEngine<'a, G: 'a + FactorGraph + 'static> {

    /// The sampler for the factor graph
    sampler: &'a mut GibbsSampler<G>,

    /// The number of sweeps per call to `infer`
    epochs: usize,

    /// Sweeps run so far, burn-in included
    i_epoch: usize

}

impl<'a, G: 'a + FactorGraph + 'static> McmcEngine<'a, G> {

    /// Construct an `McmcEngine`, burning in the sampler first.
    ///
    /// Samples drawn during burn-in are discarded.
    ///
    /// # Errors
    /// Any error of the burn-in sweeps
    pub fn new(sampler: &'a mut GibbsSampler<G>, burnin: usize, epochs: usize) -> Result<Self> {
        // let the sampler burnin
        for i_epoch in 0..burnin {
            sampler.sample(i_epoch)?;
            sampler.wait()?;
        }
        sampler.result().clear_variabletally();

        debug!(burnin, epochs, "Burn-in complete");
        Ok(McmcEngine { sampler, epochs, i_epoch: burnin })
    }

    /// Run the sweeps and estimate the marginal of every variable.
    ///
    /// Repeated calls keep accumulating samples, so later calls give tighter estimates.
    ///
    /// # Returns
    /// one marginal per variable in id order, `None` for variables that were never sampled
    /// (observations, and evidence unless evidence is sampled)
    pub fn infer(&mut self) -> Result<Vec<Option<Marginal>>> {
        for _ in 0..self.epochs {
            self.sampler.sample(self.i_epoch)?;
            self.sampler.wait()?;
            self.i_epoch += 1;
        }

        let infrs = self.sampler.result();
        let marginals = self.sampler
                            .graph()
                            .variables()
                            .iter()
                            .map(|v| infrs.marginal(v))
                            .collect();
        Ok(marginals)
    }

    /// Sweeps run so far, burn-in included
    pub fn epochs_run(&self) -> usize {
        self.i_epoch
    }
}
