//! Defines the state a sampler mutates and the engines that turn samples into marginals.

use ndarray::prelude as nd;

mod mcmc;
mod result;

pub use self::mcmc::McmcEngine;
pub use self::result::{InferenceResult, Regularization};


/// The estimated marginal distribution of one `Variable`
#[derive(Clone, Debug, PartialEq)]
pub enum Marginal {

    /// ```P(v = 1)```
    Boolean(f64),

    /// ```P(v = value)``` for every value of the domain, indexed by dense index
    Multinomial(nd::Array1<f64>)

}

impl Marginal {

    /// The probability of the domain value at dense index `index`
    pub fn probability(&self, index: usize) -> f64 {
        match *self {
            Marginal::Boolean(p) if index == 1 => p,
            Marginal::Boolean(p) if index == 0 => 1.0 - p,
            Marginal::Boolean(_) => 0.0,
            Marginal::Multinomial(ref p) => p.get(index).cloned().unwrap_or(0.0)
        }
    }

    /// The dense index of the most probable value. Ties go to the lowest index.
    pub fn mode(&self) -> usize {
        match *self {
            Marginal::Boolean(p) => if p > 0.5 { 1 } else { 0 },
            Marginal::Multinomial(ref p) => {
                p.iter()
                 .enumerate()
                 .fold((0, f64::NEG_INFINITY), |best, (i, &q)| if q > best.1 { (i, q) } else { best })
                 .0
            }
        }
    }
}
