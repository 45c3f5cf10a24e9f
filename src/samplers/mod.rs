//! Defines the parallel Gibbs sampler: a coordinator that splits a factor graph into shards and a
//! `GibbsSamplerThread` that sweeps each one.

use util::{GibbsError, Result};
use variable::VariableIndex;

use itertools::Itertools;

use std::ops::Range;

mod gibbs;
mod rand48;
mod thread;

pub use self::gibbs::GibbsSampler;
pub use self::rand48::Rand48;
pub use self::thread::GibbsSamplerThread;

/// A contiguous range of variable ids owned by one sampler thread
pub type Shard = Range<VariableIndex>;


/// Split the ids `0..nvariables` into `nshards` contiguous shards.
///
/// The first `nvariables % nshards` shards get one id more than the rest, so the sizes differ by
/// at most one.
///
/// # Errors
/// * `GibbsError::ZeroThreads` if `nshards` is zero
/// * `GibbsError::TooManyShards` if some shard would be empty
pub fn shards(nvariables: usize, nshards: usize) -> Result<Vec<Shard>> {
    if nshards == 0 {
        return Err(GibbsError::ZeroThreads);
    }

    if nshards > nvariables {
        return Err(GibbsError::TooManyShards { shards: nshards, variables: nvariables });
    }

    let base = nvariables / nshards;
    let rem = nvariables % nshards;
    let bounds: Vec<VariableIndex> = (0..nshards + 1).map(|i| i * base + i.min(rem)).collect();

    Ok(bounds.iter().tuple_windows().map(|(&start, &end)| start..end).collect())
}
