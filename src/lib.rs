//! Parallel Gibbs sampling over discrete factor graphs.
//!
//! A `GibbsSampler` splits the variables of a `FactorGraph` into contiguous shards and sweeps
//! them from one thread per shard, all sharing a single `InferenceResult`. The same sweeps drive
//! marginal inference (`McmcEngine`) and stochastic gradient weight learning (`SgdEstimator`).

extern crate bidir_map;
extern crate indexmap;
extern crate itertools;
#[cfg_attr(test, macro_use)]
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;
extern crate rand_core;
extern crate serde;
extern crate thiserror;
extern crate toml;
#[macro_use]
extern crate tracing;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod config;
pub mod estimators;
pub mod factor;
pub mod graph;
pub mod inference;
pub mod init;
pub mod samplers;
pub mod shared;
pub mod util;
pub mod variable;

pub use config::{Config, InferenceConfig, LearningConfig, SamplerConfig};
pub use estimators::{Estimator, SgdEstimator};
pub use factor::{Factor, FactorFunction, VariableInFactor, Weight};
pub use graph::{CompactFactorGraph, FactorGraph, FactorGraphBuilder};
pub use inference::{InferenceResult, Marginal, McmcEngine, Regularization};
pub use init::Initialization;
pub use samplers::{GibbsSampler, GibbsSamplerThread, Rand48};
pub use shared::SharedArray;
pub use util::{GibbsError, Result};
pub use variable::{DomainType, Variable, VariableIndex, VariableValue};
