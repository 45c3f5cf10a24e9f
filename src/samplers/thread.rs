//! Defines the `GibbsSamplerThread`, which sweeps one shard of a factor graph.
//!
//! Implementation of single-site Gibbs sampling (Koller & Friedman Algorithm 12.4) over a
//! contiguous range of variable ids, and of the contrastive stochastic gradient step used to learn
//! weights.

use config::SamplerConfig;
use graph::FactorGraph;
use inference::InferenceResult;
use shared::SharedArray;
use util::{logadd, GibbsError, Result};
use variable::{DomainType, Variable, VariableIndex, VariableValue};
use super::Rand48;

use std::ops::Range;
use std::sync::Arc;

/// Samples the variables of one shard.
///
/// A `GibbsSamplerThread` is built once per shard and reused for every sweep. It owns its random
/// stream and scratch space; the graph and the `InferenceResult` are shared with every other
/// shard.
pub struct GibbsSamplerThread<G: FactorGraph> {

    /// The shard: the ids this thread samples
    start: VariableIndex,

    end: VariableIndex,

    proposer: Proposer,

    fg: Arc<G>,

    infrs: Arc<InferenceResult>,

    sample_evidence: bool,

    learn_non_evidence: bool

}


impl<G: FactorGraph> GibbsSamplerThread<G> {

    /// Construct a `GibbsSamplerThread` for the ids in `shard`
    pub fn new(fg: Arc<G>, infrs: Arc<InferenceResult>, shard: Range<VariableIndex>, rng: Rand48,
               config: &SamplerConfig) -> Self {
        // one slot per value of the widest multinomial
        let width = fg.variables()
                      .iter()
                      .filter(|v| v.domain_type() == DomainType::Multinomial)
                      .map(|v| v.domain_size())
                      .max()
                      .unwrap_or(0);

        GibbsSamplerThread {
            start: shard.start,
            end: shard.end,
            proposer: Proposer { rng, potentials: vec![0.0; width] },
            fg,
            infrs,
            sample_evidence: config.sample_evidence,
            learn_non_evidence: config.learn_non_evidence
        }
    }

    /// The ids this thread samples
    pub fn shard(&self) -> Range<VariableIndex> {
        self.start..self.end
    }

    /// Reset the random stream to the given state words
    pub fn set_random_seed(&mut self, s0: u16, s1: u16, s2: u16) {
        self.proposer.rng.set_seed(s0, s1, s2);
    }

    /// Sample every variable of the shard once, in ascending id order.
    ///
    /// # Errors
    /// * `GibbsError::UnsupportedDomain` if a variable cannot be sampled. The sweep stops there.
    pub fn sample(&mut self) -> Result<()> {
        for vid in self.start..self.end {
            self.sample_single_variable(vid)?;
        }
        Ok(())
    }

    /// Take a stochastic gradient step for every variable of the shard, in ascending id order.
    pub fn sample_sgd(&mut self, stepsize: f64) -> Result<()> {
        for vid in self.start..self.end {
            self.sample_sgd_single_variable(vid, stepsize)?;
        }
        Ok(())
    }

    /// Resample variable `vid` in the evidence chain and record the sample.
    ///
    /// Observations are never resampled, and neither is evidence unless the sampler was
    /// configured to sample evidence.
    pub fn sample_single_variable(&mut self, vid: VariableIndex) -> Result<()> {
        let variable = &self.fg.variables()[vid];
        if variable.is_observation() {
            return Ok(());
        }

        if variable.is_evidence() && ! self.sample_evidence {
            return Ok(());
        }

        let evid = self.infrs.assignments_evid();
        let (proposal, index) = self.proposer.draw(&*self.fg, variable, evid, self.infrs.weight_values())?;
        evid.set(vid, proposal);

        // bookkeeping for the marginals
        self.infrs.record_sample(variable, proposal, index);
        Ok(())
    }

    /// One step of stochastic gradient ascent around variable `vid`.
    ///
    /// The gradient of a weight is ```E[f | evidence] - E[f]```. Both expectations are estimated
    /// from a single sample: one from the chain that keeps evidence clamped, one from the chain
    /// that ignores it.
    pub fn sample_sgd_single_variable(&mut self, vid: VariableIndex, stepsize: f64) -> Result<()> {
        let variable = &self.fg.variables()[vid];
        if variable.is_observation() {
            return Ok(());
        }

        if ! self.learn_non_evidence && ! variable.is_evidence() {
            return Ok(());
        }

        let weights = self.infrs.weight_values();

        // sample the variable with evidence unchanged
        let evid = self.infrs.assignments_evid();
        let proposal = if variable.is_evidence() {
            variable.evidence_value()
        } else {
            self.proposer.draw(&*self.fg, variable, evid, weights)?.0
        };
        evid.set(vid, proposal);

        // sample the variable regardless of whether it is evidence
        let free = self.infrs.assignments_free();
        let (proposal, _) = self.proposer.draw(&*self.fg, variable, free, weights)?;
        free.set(vid, proposal);

        self.fg.update_weight(variable, &self.infrs, stepsize);
        Ok(())
    }

    /// Draw a value for `variable` from its conditional distribution given `assignments`.
    ///
    /// # Errors
    /// * `GibbsError::UnsupportedDomain` if `variable` is neither boolean nor multinomial
    pub fn draw_sample(&mut self, variable: &Variable, assignments: &SharedArray<VariableValue>,
                       weights: &SharedArray<f64>) -> Result<VariableValue> {
        self.proposer.draw(&*self.fg, variable, assignments, weights).map(|(value, _)| value)
    }
}


/// The random stream and scratch space behind every draw
struct Proposer {

    rng: Rand48,

    /// Potential of each candidate of the multinomial being drawn, by dense index
    potentials: Vec<f64>

}

impl Proposer {

    /// Draw a value for `variable`, returning it along with its dense index
    fn draw<G: FactorGraph + ?Sized>(&mut self, fg: &G, variable: &Variable,
                                     assignments: &SharedArray<VariableValue>,
                                     weights: &SharedArray<f64>) -> Result<(VariableValue, usize)> {
        match variable.domain_type() {
            DomainType::Boolean => {
                let potential_pos = fg.potential(variable, 1, assignments, weights);
                let potential_neg = fg.potential(variable, 0, assignments, weights);

                // P(1) = exp(pos) / (exp(pos) + exp(neg)) = 1 / (1 + exp(neg - pos)), which stays
                // finite however large pos gets
                let r = self.rng.next_f64();
                if r * (1.0 + (potential_neg - potential_pos).exp()) < 1.0 {
                    Ok((1, 1))
                } else {
                    Ok((0, 0))
                }
            },

            DomainType::Multinomial => {
                let size = variable.domain_size();
                if self.potentials.len() < size {
                    self.potentials.resize(size, 0.0);
                }

                // first pass: score every candidate and accumulate the log normalizer
                let mut sum = f64::NEG_INFINITY;
                for (value, index) in variable.domain_values() {
                    let potential = fg.potential(variable, value, assignments, weights);
                    self.potentials[index] = potential;
                    sum = logadd(sum, potential);
                }

                // second pass: walk the same candidates until the draw is used up
                let r = self.rng.next_f64();
                select_proposal(variable.domain_values(), &self.potentials, sum, r)
                    .ok_or_else(|| GibbsError::InvalidDomain {
                        vid: variable.id(),
                        reason: String::from("multinomial domain is empty")
                    })
            },

            domain => Err(GibbsError::UnsupportedDomain { vid: variable.id(), domain })
        }
    }
}


/// Pick the first candidate at which the cumulative probability reaches `r`.
///
/// `potentials` holds the log-potential of each candidate by dense index, and `log_z` their
/// log-sum-exp. If rounding leaves the cumulative probability short of `r`, the last candidate is
/// picked.
///
/// # Returns
/// the chosen `(value, dense index)`, or `None` only if `candidates` is empty
fn select_proposal<I>(candidates: I, potentials: &[f64], log_z: f64, r: f64) -> Option<(VariableValue, usize)>
    where I: Iterator<Item = (VariableValue, usize)>
{
    let mut r = r;
    let mut proposal = None;
    for (value, index) in candidates {
        proposal = Some((value, index));
        r -= (potentials[index] - log_z).exp();
        if r <= 0.0 {
            break;
        }
    }
    proposal
}


#[cfg(test)]
mod tests {
    use super::*;
    use factor::{FactorFunction, VariableInFactor, Weight};
    use graph::{CompactFactorGraph, FactorGraphBuilder};
    use init::Initialization;
    use rand::SeedableRng;
    use util::sigmoid;

    fn thread_for(fg: CompactFactorGraph, config: &SamplerConfig) -> GibbsSamplerThread<CompactFactorGraph> {
        let infrs = InferenceResult::new(&fg, fg.weights(), Initialization::Clamped, 0).unwrap();
        let n = fg.num_variables();
        GibbsSamplerThread::new(Arc::new(fg), Arc::new(infrs), 0..n, Rand48::seed_from_u64(5), config)
    }

    /// A single boolean with a bias of weight `w`
    fn biased(w: f64) -> CompactFactorGraph {
        FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::fixed(0, w))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .build()
            .unwrap()
    }

    /// A multinomial whose value `i` has log-potential `potentials[i]`
    fn categorical(var: Variable, potentials: &[f64]) -> CompactFactorGraph {
        let mut builder = FactorGraphBuilder::new().with_variable(var.clone());
        for (index, &p) in potentials.iter().enumerate() {
            let value = var.domain_value(index).unwrap();
            builder = builder.with_weight(Weight::fixed(index, p))
                             .with_factor(FactorFunction::AndCategorical, index, vec![VariableInFactor::equals(0, value)]);
        }
        builder.build().unwrap()
    }

    #[test]
    fn boolean_acceptance() {
        let c = 0.8;
        let mut t = thread_for(biased(c), &SamplerConfig::default());

        let n = 40_000;
        for _ in 0..n {
            t.sample().unwrap();
        }

        let infrs = t.infrs.clone();
        assert_eq!(infrs.agg_nsamples().get(0), n);
        let p = infrs.agg_means().get(0) / n as f64;
        assert!((p - sigmoid(c)).abs() < 0.015, "p = {}, expected {}", p, sigmoid(c));
    }

    #[test]
    fn boolean_extreme_potential() {
        // a huge positive potential must not overflow into NaN
        let mut t = thread_for(biased(1e6), &SamplerConfig::default());
        for _ in 0..100 {
            t.sample().unwrap();
        }
        assert_eq!(t.infrs.agg_means().get(0), 100.0);

        let mut t = thread_for(biased(-1e6), &SamplerConfig::default());
        for _ in 0..100 {
            t.sample().unwrap();
        }
        assert_eq!(t.infrs.agg_means().get(0), 0.0);
    }

    #[test]
    fn multinomial_normalization() {
        let potentials = [0.0, 1.0, -0.5, 0.3];
        let mut t = thread_for(categorical(Variable::multinomial(0, 4), &potentials), &SamplerConfig::default());

        let n = 40_000;
        for _ in 0..n {
            t.sample().unwrap();
        }

        let z: f64 = potentials.iter().map(|p| p.exp()).sum();
        for (i, p) in potentials.iter().enumerate() {
            let expected = p.exp() / z;
            let actual = t.infrs.multinomial_tallies().get(i) as f64 / n as f64;
            assert!((expected - actual).abs() < 0.015, "value {}: {} vs {}", i, actual, expected);
        }
    }

    #[test]
    fn sparse_domain() {
        let var = Variable::sparse_multinomial(0, 20, &[17, 3, 11]);
        let mut t = thread_for(categorical(var, &[0.0, 0.0, 0.0]), &SamplerConfig::default());

        let mut seen = [false; 20];
        for _ in 0..300 {
            t.sample().unwrap();
            let value = t.infrs.assignments_evid().get(0);
            assert!(value == 17 || value == 3 || value == 11, "proposed {}", value);
            seen[value] = true;
        }
        assert!(seen[17] && seen[3] && seen[11]);

        // tallies are indexed by dense index, not by value
        let tallies = t.infrs.multinomial_tallies().to_vec();
        assert_eq!(tallies.len(), 3);
        assert_eq!(tallies.iter().sum::<u64>(), 300);
    }

    #[test]
    fn sparse_domain_frequencies() {
        // dense index 0 is value 17, 1 is value 3, 2 is value 11
        let values = [17, 3, 11];
        let potentials = [1.0, -1.0, 0.0];
        let var = Variable::sparse_multinomial(0, 20, &values);
        let mut t = thread_for(categorical(var, &potentials), &SamplerConfig::default());

        let n = 40_000;
        let mut by_value = [0usize; 20];
        for _ in 0..n {
            t.sample().unwrap();
            by_value[t.infrs.assignments_evid().get(0)] += 1;
        }

        let z: f64 = potentials.iter().map(|p| p.exp()).sum();
        let tallies = t.infrs.multinomial_tallies().to_vec();
        for (index, (&value, p)) in values.iter().zip(potentials.iter()).enumerate() {
            let expected = p.exp() / z;
            let drawn = by_value[value] as f64 / n as f64;
            let tallied = tallies[index] as f64 / n as f64;
            assert!((drawn - expected).abs() < 0.015, "value {}: {} vs {}", value, drawn, expected);
            assert!((tallied - drawn).abs() < 1e-12, "index {}: tallied {} drawn {}", index, tallied, drawn);
        }
    }

    #[test]
    fn rounding_fallback() {
        let candidates = vec![(4, 0), (9, 1), (2, 2)];
        let potentials = [0.0, 0.0, 0.0];

        // an inflated normalizer leaves the probabilities summing just short of one
        let log_z = 3f64.ln() + 1e-9;
        let r = 1.0 - 1e-12;
        assert_eq!(select_proposal(candidates.iter().cloned(), &potentials, log_z, r), Some((2, 2)));

        // the usual case picks by cumulative probability
        let log_z = 3f64.ln();
        assert_eq!(select_proposal(candidates.iter().cloned(), &potentials, log_z, 0.2), Some((4, 0)));
        assert_eq!(select_proposal(candidates.iter().cloned(), &potentials, log_z, 0.5), Some((9, 1)));
        assert_eq!(select_proposal(candidates.iter().cloned(), &potentials, log_z, 0.9), Some((2, 2)));

        assert_eq!(select_proposal(Vec::new().into_iter(), &potentials, log_z, 0.5), None);
    }

    #[test]
    fn observation_invariance() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0).observation(0))
            .with_variable(Variable::boolean(1))
            .with_weight(Weight::learnable(0, 5.0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .with_factor(FactorFunction::Equal, 0, vec![
                VariableInFactor::boolean(0, true),
                VariableInFactor::boolean(1, true)
            ])
            .build()
            .unwrap();

        let config = SamplerConfig { sample_evidence: true, learn_non_evidence: true, ..SamplerConfig::default() };
        let mut t = thread_for(fg, &config);

        for _ in 0..200 {
            t.sample().unwrap();
            t.sample_sgd(0.1).unwrap();
            assert_eq!(t.infrs.assignments_evid().get(0), 0);
            assert_eq!(t.infrs.assignments_free().get(0), 0);
        }
        assert_eq!(t.infrs.agg_nsamples().get(0), 0);
        assert_eq!(t.infrs.agg_nsamples().get(1), 200);
    }

    #[test]
    fn evidence_clamping() {
        // the bias pulls hard towards 0, away from the evidence
        let fg = || FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0).evidence(1))
            .with_weight(Weight::fixed(0, -3.0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .build()
            .unwrap();

        let mut t = thread_for(fg(), &SamplerConfig::default());
        for _ in 0..200 {
            t.sample().unwrap();
            assert_eq!(t.infrs.assignments_evid().get(0), 1);
        }
        assert_eq!(t.infrs.agg_nsamples().get(0), 0);

        let config = SamplerConfig { sample_evidence: true, ..SamplerConfig::default() };
        let mut t = thread_for(fg(), &config);
        let mut changed = false;
        for _ in 0..200 {
            t.sample().unwrap();
            changed |= t.infrs.assignments_evid().get(0) == 0;
        }
        assert!(changed);
        assert_eq!(t.infrs.agg_nsamples().get(0), 200);
        assert!(t.infrs.agg_means().get(0) < 200.0);
    }

    #[test]
    fn sgd_learns_bias() {
        // evidence says the variable is always true; learning should push the bias up
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0).evidence(1))
            .with_weight(Weight::learnable(0, 0.0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .build()
            .unwrap();

        let mut t = thread_for(fg, &SamplerConfig::default());
        for _ in 0..500 {
            t.sample_sgd(0.1).unwrap();
        }

        assert_eq!(t.infrs.assignments_evid().get(0), 1);
        assert!(t.infrs.weights()[0] > 1.0, "weight = {}", t.infrs.weights()[0]);
    }

    #[test]
    fn sgd_skips_non_evidence() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::learnable(0, 0.0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .build()
            .unwrap();

        let mut t = thread_for(fg, &SamplerConfig::default());
        for _ in 0..50 {
            t.sample_sgd(0.1).unwrap();
        }
        assert_eq!(t.infrs.weights()[0], 0.0);
        assert_eq!(t.infrs.assignments_free().get(0), 0);
    }

    #[test]
    fn unsupported_domain() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_variable(Variable::continuous(1))
            .with_variable(Variable::boolean(2))
            .build()
            .unwrap();

        let mut t = thread_for(fg, &SamplerConfig::default());
        match t.sample() {
            Err(GibbsError::UnsupportedDomain { vid: 1, domain: DomainType::Continuous }) => (),
            other => panic!("unexpected {:?}", other)
        }

        // the sweep stops at the broken variable
        assert_eq!(t.infrs.agg_nsamples().get(0), 1);
        assert_eq!(t.infrs.agg_nsamples().get(2), 0);
    }

    #[test]
    fn tally_consistency() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_variable(Variable::boolean(1).evidence(1))
            .with_variable(Variable::boolean(2).observation(0))
            .with_variable(Variable::multinomial(3, 3))
            .build()
            .unwrap();

        let mut t = thread_for(fg, &SamplerConfig::default());
        for _ in 0..37 {
            t.sample().unwrap();
        }

        assert_eq!(t.infrs.agg_nsamples().to_vec(), vec![37, 0, 0, 37]);
        assert_eq!(t.infrs.multinomial_tallies().to_vec().iter().sum::<u64>(), 37);
    }

    #[test]
    fn reseeding_reproduces() {
        let potentials = [0.2, -0.1, 0.4];
        let mut t = thread_for(categorical(Variable::multinomial(0, 3), &potentials), &SamplerConfig::default());

        let run = |t: &mut GibbsSamplerThread<CompactFactorGraph>| -> Vec<usize> {
            t.set_random_seed(1, 2, 3);
            (0..50).map(|_| {
                t.sample().unwrap();
                t.infrs.assignments_evid().get(0)
            }).collect()
        };

        let first = run(&mut t);
        let second = run(&mut t);
        assert_eq!(first, second);
    }

    #[test]
    fn draw_does_not_write() {
        let fg = biased(0.0);
        let mut t = thread_for(fg, &SamplerConfig::default());
        let assignments = SharedArray::new(1, 0usize);
        let weights = SharedArray::new(1, 0.0);
        for _ in 0..20 {
            let v = t.draw_sample(&Variable::boolean(0), &assignments, &weights).unwrap();
            assert!(v < 2);
        }
        assert_eq!(assignments.get(0), 0);
        assert_eq!(t.infrs.agg_nsamples().get(0), 0);
    }
}
