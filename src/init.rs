//! Module containing initialization routines for the assignments of a factor graph.

use variable::{Variable, VariableValue};

use ndarray::prelude as nd;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Defines possible ways to pick the starting value of every `Variable`.
///
/// Evidence always starts at its clamped value, whatever the `Initialization`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initialization {
    /// Every non-evidence `Variable` starts at the first value of its domain
    Clamped,

    /// Every non-evidence `Variable` starts at a value drawn uniformly from its domain
    Random
}

impl Default for Initialization {
    fn default() -> Self {
        Initialization::Clamped
    }
}


impl Initialization {

    /// Build a starting assignment, initialized based on ```self```
    ///
    /// # Args
    /// * `variables`: the `Variable`s to assign, indexed by id
    /// * `seed`: seeds the draws of `Initialization::Random`
    ///
    /// # Returns
    /// one value per `Variable`, in id order
    pub fn assign(self, variables: &[Variable], seed: u64) -> Vec<VariableValue> {
        let draws: nd::Array1<f64> = match self {
            Initialization::Clamped => nd::Array1::zeros(variables.len()),
            Initialization::Random => {
                let mut rng = StdRng::seed_from_u64(seed);
                nd::Array1::random_using(variables.len(), Uniform::new(0.0, 1.0), &mut rng)
            }
        };

        variables.iter()
                 .zip(draws.iter())
                 .map(|(v, &u)| {
                     if v.is_evidence() {
                         return v.evidence_value();
                     }

                     // scale the draw onto the dense indices; a zero draw is the first value
                     let size = v.domain_size();
                     let index = ((u * size as f64) as usize).min(size.saturating_sub(1));
                     v.domain_value(index).unwrap_or(0)
                 })
                 .collect()
    }
}
