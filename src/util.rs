//! Defines the `Error` type for the gibbs-engine library, along with a few numeric helpers shared
//! by the samplers.

use variable::{DomainType, VariableIndex};

use thiserror::Error;

use std::io;
use std::result;

pub type Result<T> = result::Result<T, GibbsError>;

#[derive(Debug, Error)]
pub enum GibbsError {

    /// A sampler was requested with no worker threads
    #[error("The number of threads must be at least 1")]
    ZeroThreads,

    /// More shards were requested than there are variables to put in them
    #[error("Cannot split {variables} variables into {shards} shards")]
    TooManyShards { shards: usize, variables: usize },

    /// The weights handed to a sampler do not line up with the weights the graph refers to
    #[error("Weight mismatch: {0}")]
    WeightMismatch(String),

    /// A configuration value is out of range or could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("Variable {0} was declared twice")]
    DuplicateVariable(VariableIndex),

    /// Two `Variable`s were given the same name
    #[error("Variable name {0:?} was used twice")]
    DuplicateName(String),

    /// A variable id was referenced, or expected, but never declared
    #[error("Variable {0} is missing from the graph")]
    MissingVariable(VariableIndex),

    /// A factor refers to a weight that was never declared
    #[error("Weight {0} is missing from the graph")]
    MissingWeight(usize),

    /// A variable's domain, or a value assigned to it, is inconsistent with its cardinality
    #[error("Invalid domain for variable {vid}: {reason}")]
    InvalidDomain { vid: VariableIndex, reason: String },

    /// A factor was declared without any variables
    #[error("Factor {0} has no variables")]
    EmptyFactor(usize),

    /// The sampler met a variable whose domain it cannot draw from. This indicates a
    /// structurally broken factor graph and is not recoverable.
    #[error("Cannot sample variable {vid} with unsupported domain type {domain:?}")]
    UnsupportedDomain { vid: VariableIndex, domain: DomainType },

    /// A sweep was started before the previous one was waited on
    #[error("A sweep is already in progress; call wait() first")]
    SweepInProgress,

    /// A worker was lost by an earlier failure and can no longer be scheduled
    #[error("Worker {0} is unavailable")]
    WorkerUnavailable(usize),

    /// A worker thread panicked during a sweep
    #[error("Worker {0} panicked during a sweep")]
    WorkerPanicked(usize),

    /// The operating system refused to start a worker thread
    #[error("Failed to spawn a worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

}

impl GibbsError {

    /// Whether the error means the factor graph itself cannot be sampled
    pub fn is_fatal(&self) -> bool {
        match self {
            &GibbsError::UnsupportedDomain { .. } => true,
            _ => false
        }
    }

}

impl From<::toml::de::Error> for GibbsError {

    fn from(e: ::toml::de::Error) -> Self {
        GibbsError::InvalidConfig(e.to_string())
    }

}


/// Add two numbers in the log domain: computes `ln(exp(log_a) + exp(log_b))` without leaving it.
///
/// `-inf` is the additive identity.
pub fn logadd(log_a: f64, log_b: f64) -> f64 {
    let (hi, lo) = if log_a < log_b { (log_b, log_a) } else { (log_a, log_b) };
    if lo == f64::NEG_INFINITY {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}


/// The logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
