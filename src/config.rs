//! Configuration of the samplers and of the engines that drive them.
//!
//! Every section has defaults, so a configuration file only needs to name what it changes:
//!
//! ```toml
//! [sampler]
//! sample_evidence = false
//! seed = 7
//!
//! [learning]
//! n_epochs = 300
//! stepsize = 0.05
//! regularization = "l1"
//! ```

use inference::Regularization;
use init::Initialization;
use util::{GibbsError, Result};

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;

/// Everything a single node needs to learn and infer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub learning: LearningConfig,
    pub inference: InferenceConfig
}

impl Config {

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = ::toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path)?;
        Config::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.learning.validate()
    }
}


/// Flags cached by every sampler thread
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Resample evidence variables during inference instead of keeping them clamped
    pub sample_evidence: bool,

    /// Resample and learn from non-evidence variables during learning
    pub learn_non_evidence: bool,

    /// Base seed; each sampler thread derives its own stream from it
    pub seed: u64,

    /// How the assignments start out
    pub initialization: Initialization,

    /// Stack size of the sampler threads in bytes; the platform default when unset
    pub stack_size: Option<usize>
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            sample_evidence: false,
            learn_non_evidence: false,
            seed: 1,
            initialization: Initialization::Clamped,
            stack_size: None
        }
    }
}


/// Schedule of stochastic gradient weight learning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Number of learning sweeps
    pub n_epochs: usize,

    /// Step size of the first sweep
    pub stepsize: f64,

    /// The step size is multiplied by `decay` after every sweep
    pub decay: f64,

    pub regularization: Regularization,

    /// Strength of the regularization
    pub reg_param: f64
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig {
            n_epochs: 100,
            stepsize: 0.01,
            decay: 0.95,
            regularization: Regularization::L2,
            reg_param: 0.01
        }
    }
}

impl LearningConfig {

    /// # Errors
    /// * `GibbsError::InvalidConfig` if the step size is not positive, the decay is outside of
    ///   `(0, 1]`, or the regularization parameter is negative
    pub fn validate(&self) -> Result<()> {
        if !(self.stepsize > 0.0) || !self.stepsize.is_finite() {
            return Err(GibbsError::InvalidConfig(format!("stepsize must be positive, got {}", self.stepsize)));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(GibbsError::InvalidConfig(format!("decay must be in (0, 1], got {}", self.decay)));
        }
        if !(self.reg_param >= 0.0) || !self.reg_param.is_finite() {
            return Err(GibbsError::InvalidConfig(format!("reg_param must be non-negative, got {}", self.reg_param)));
        }
        Ok(())
    }
}


/// Schedule of marginal inference
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Sweeps to run before counting samples
    pub burn_in: usize,

    /// Sweeps whose samples are counted
    pub n_epochs: usize
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig { burn_in: 0, n_epochs: 100 }
    }
}
